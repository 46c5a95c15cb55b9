use std::{fmt, path::Path, str::FromStr};

use serde::Serialize;

use crate::{
    error::ServiceError,
    labels::{CLASS_COUNT, Severity},
};

pub const INPUT_SIZE: u32 = 28;
pub const INPUT_CHANNELS: usize = 3;
/// NHWC layout of the single sample the classifier consumes.
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    #[default]
    Onnx,
    TorchScript,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "onnx" => Some(ModelFormat::Onnx),
            "pt" | "ts" => Some(ModelFormat::TorchScript),
            _ => None,
        }
    }
}

impl FromStr for ModelFormat {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "onnx" => Ok(ModelFormat::Onnx),
            "torchscript" | "ts" | "pt" => Ok(ModelFormat::TorchScript),
            other => Err(ServiceError::Other(format!("unknown model format '{other}'"))),
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Onnx => f.write_str("onnx"),
            ModelFormat::TorchScript => f.write_str("torchscript"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub name: String,
    pub format: ModelFormat,
    pub path: String,
    pub size_bytes: u64,
}

/// Pixel data laid out as [`INPUT_SHAPE`], channel values kept in 0..=255.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
}

impl ImageTensor {
    pub const LEN: usize = INPUT_SHAPE[0] * INPUT_SHAPE[1] * INPUT_SHAPE[2] * INPUT_SHAPE[3];

    pub fn new(data: Vec<f32>) -> Result<Self, ServiceError> {
        if data.len() != Self::LEN {
            return Err(ServiceError::Other(format!(
                "image tensor needs {} values, got {}",
                Self::LEN,
                data.len()
            )));
        }
        Ok(Self { data })
    }

    pub fn shape(&self) -> [usize; 4] {
        INPUT_SHAPE
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub severity: Severity,
    pub description: &'static str,
    pub probability: f32,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Reduces a class probability vector to its most likely class. The first
    /// maximum wins when several entries tie.
    pub fn from_probabilities(probabilities: Vec<f32>) -> Result<Self, ServiceError> {
        if probabilities.len() != CLASS_COUNT {
            return Err(ServiceError::Inference(format!(
                "expected {CLASS_COUNT} class probabilities, model returned {}",
                probabilities.len()
            )));
        }
        if let Some(bad) = probabilities.iter().position(|p| !p.is_finite()) {
            return Err(ServiceError::Inference(format!(
                "model returned non-finite probability {} for class {bad}",
                probabilities[bad]
            )));
        }

        let mut index = 0;
        for (idx, &value) in probabilities.iter().enumerate() {
            if value > probabilities[index] {
                index = idx;
            }
        }

        let severity = Severity::from_index(index).ok_or_else(|| {
            ServiceError::Inference(format!("class index {index} has no label"))
        })?;

        Ok(Self {
            index,
            severity,
            description: severity.description(),
            probability: probabilities[index],
            probabilities,
        })
    }
}
