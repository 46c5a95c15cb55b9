use std::path::Path;

use parking_lot::Mutex;
use tch::{Device, Kind, Tensor, no_grad};

use crate::{
    error::ServiceError,
    model::{
        Classifier, ImageTensor, ModelFormat, ModelMetadata, loader::artifact_metadata,
        types::INPUT_SHAPE,
    },
};

pub struct TorchClassifier {
    device: Device,
    metadata: ModelMetadata,
    module: Mutex<tch::CModule>,
}

impl TorchClassifier {
    pub fn load(path: &Path, device: Device) -> Result<Self, ServiceError> {
        let metadata = artifact_metadata(path, ModelFormat::TorchScript)?;
        let mut module = tch::CModule::load_on_device(path, device)
            .map_err(|e| ServiceError::ModelArtifact(e.to_string()))?;
        module.set_eval();

        tracing::info!(model = %metadata.name, ?device, "torchscript model ready");
        Ok(Self {
            device,
            metadata,
            module: Mutex::new(module),
        })
    }
}

impl Classifier for TorchClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ServiceError> {
        let shape: Vec<i64> = INPUT_SHAPE.iter().map(|&d| d as i64).collect();
        let input = Tensor::from_slice(input.as_slice())
            .reshape(shape.as_slice())
            .to(self.device);

        let output = no_grad(|| {
            let module = self.module.lock();
            module.forward_ts(&[input])
        })
        .map_err(|e| ServiceError::Inference(e.to_string()))?;

        let flat = output
            .to_kind(Kind::Float)
            .to(Device::Cpu)
            .flatten(0, -1);
        Vec::<f32>::try_from(&flat).map_err(|e| ServiceError::Inference(e.to_string()))
    }

    fn metadata(&self) -> ModelMetadata {
        self.metadata.clone()
    }
}
