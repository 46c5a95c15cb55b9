use std::{fs, path::Path, sync::Arc};

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{ImageTensor, ModelFormat, ModelMetadata},
};

pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ServiceError>;

    fn metadata(&self) -> ModelMetadata;
}

pub fn load_classifier(config: &AppConfig) -> Result<Arc<dyn Classifier>, ServiceError> {
    let path = config.model_path.as_path();
    match config.model_format {
        #[cfg(feature = "onnx-backend")]
        ModelFormat::Onnx => Ok(Arc::new(super::onnx::OnnxClassifier::load(path)?)),
        #[cfg(feature = "tch-backend")]
        ModelFormat::TorchScript => Ok(Arc::new(super::torch::TorchClassifier::load(
            path,
            config.device,
        )?)),
        #[allow(unreachable_patterns)]
        format => Err(ServiceError::ModelArtifact(format!(
            "no backend compiled in for {format} models ({})",
            path.display()
        ))),
    }
}

pub(crate) fn artifact_metadata(
    path: &Path,
    format: ModelFormat,
) -> Result<ModelMetadata, ServiceError> {
    if !path.exists() {
        return Err(ServiceError::ModelArtifact(format!(
            "model artifact missing: {}",
            path.display()
        )));
    }
    let size_bytes = fs::metadata(path)?.len();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();

    Ok(ModelMetadata {
        name,
        format,
        path: path.display().to_string(),
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_is_reported() {
        let err = artifact_metadata(Path::new("does/not/exist.onnx"), ModelFormat::Onnx)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ModelArtifact(_)));
    }

    #[test]
    fn metadata_describes_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final.onnx");
        fs::write(&path, [0u8; 42]).unwrap();

        let meta = artifact_metadata(&path, ModelFormat::Onnx).unwrap();
        assert_eq!(meta.name, "final");
        assert_eq!(meta.size_bytes, 42);
        assert_eq!(meta.format, ModelFormat::Onnx);
    }

    #[test]
    fn loading_missing_model_fails() {
        let config = AppConfig {
            model_path: "does/not/exist.onnx".into(),
            ..AppConfig::default()
        };
        assert!(load_classifier(&config).is_err());
    }
}
