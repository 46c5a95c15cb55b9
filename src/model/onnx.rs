use std::path::Path;

use tract_onnx::prelude::*;

use crate::{
    error::ServiceError,
    model::{
        Classifier, ImageTensor, ModelFormat, ModelMetadata, loader::artifact_metadata,
        types::INPUT_SHAPE,
    },
};

pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    metadata: ModelMetadata,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let metadata = artifact_metadata(path, ModelFormat::Onnx)?;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(
                        f32::datum_type(),
                        tvec!(INPUT_SHAPE[0], INPUT_SHAPE[1], INPUT_SHAPE[2], INPUT_SHAPE[3]),
                    ),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| ServiceError::ModelArtifact(format!("{}: {e}", path.display())))?;

        tracing::info!(model = %metadata.name, size_bytes = metadata.size_bytes, "onnx model ready");
        Ok(Self { plan, metadata })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ServiceError> {
        let array = tract_ndarray::Array4::from_shape_vec(
            (INPUT_SHAPE[0], INPUT_SHAPE[1], INPUT_SHAPE[2], INPUT_SHAPE[3]),
            input.as_slice().to_vec(),
        )
        .map_err(|e| ServiceError::Inference(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(array.into_tensor().into()))
            .map_err(|e| ServiceError::Inference(e.to_string()))?;
        let output = outputs
            .first()
            .ok_or_else(|| ServiceError::Inference("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| ServiceError::Inference(e.to_string()))?;

        Ok(view.iter().copied().collect())
    }

    fn metadata(&self) -> ModelMetadata {
        self.metadata.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/classifier.onnx")
    }

    fn gradient() -> ImageTensor {
        let data = (0..ImageTensor::LEN).map(|i| (i % 256) as f32).collect();
        ImageTensor::new(data).unwrap()
    }

    #[test]
    fn fixture_yields_normalized_class_probabilities() {
        let classifier = OnnxClassifier::load(&fixture()).unwrap();

        let probabilities = classifier.predict(&gradient()).unwrap();

        assert_eq!(probabilities.len(), 5);
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        let total: f32 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-4, "probabilities sum to {total}");
    }

    #[test]
    fn repeated_inference_is_deterministic() {
        let classifier = OnnxClassifier::load(&fixture()).unwrap();
        let input = gradient();

        let first = classifier.predict(&input).unwrap();
        let second = classifier.predict(&input).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn metadata_describes_fixture() {
        let classifier = OnnxClassifier::load(&fixture()).unwrap();
        let meta = classifier.metadata();
        assert_eq!(meta.name, "classifier");
        assert_eq!(meta.format, ModelFormat::Onnx);
        assert!(meta.size_bytes > 0);
    }

    #[test]
    fn unparsable_model_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"this is not a protobuf graph").unwrap();

        let err = match OnnxClassifier::load(&path) {
            Ok(_) => panic!("garbage model loaded"),
            Err(err) => err,
        };
        assert!(matches!(err, ServiceError::ModelArtifact(_)));
    }
}
