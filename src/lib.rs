pub mod config;
pub mod error;
pub mod labels;
pub mod model;
pub mod server;
pub mod upload;
pub mod views;

pub use config::AppConfig;
pub use labels::Severity;
pub use model::{Classifier, ImageTensor, ModelMetadata, ModelRegistry, Prediction};
pub use server::build_router;
