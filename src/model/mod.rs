mod loader;
pub mod preprocess;
mod registry;
mod types;

#[cfg(feature = "onnx-backend")]
pub mod onnx;
#[cfg(feature = "tch-backend")]
pub mod torch;

pub use loader::{Classifier, load_classifier};
pub use registry::ModelRegistry;
pub use types::{ImageTensor, ModelFormat, ModelMetadata, Prediction};
