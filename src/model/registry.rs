use std::{sync::Arc, time::Instant};

use axum::body::Bytes;
use tokio::task;

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{
        ModelMetadata, Prediction,
        loader::{Classifier, load_classifier},
        preprocess,
    },
};

pub struct ModelRegistry {
    classifier: Arc<dyn Classifier>,
}

impl ModelRegistry {
    pub fn initialize(config: &AppConfig) -> Result<Self, ServiceError> {
        let classifier = load_classifier(config)?;
        Ok(Self::from_classifier(classifier))
    }

    pub fn from_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn metadata(&self) -> ModelMetadata {
        self.classifier.metadata()
    }

    pub async fn classify(&self, image: Bytes) -> Result<Prediction, ServiceError> {
        let classifier = self.classifier.clone();

        task::spawn_blocking(move || {
            let start = Instant::now();
            let tensor = preprocess::prepare(&image)?;
            let probabilities = classifier.predict(&tensor)?;
            let prediction = Prediction::from_probabilities(probabilities)?;
            tracing::info!(
                index = prediction.index,
                probability = prediction.probability,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "prediction complete"
            );
            Ok::<_, ServiceError>(prediction)
        })
        .await
        .map_err(|err| ServiceError::Inference(format!("inference task failed: {err}")))?
    }
}
