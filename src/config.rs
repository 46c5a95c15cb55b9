use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

#[cfg(feature = "tch-backend")]
use tch::Device;

use crate::model::ModelFormat;

const DEFAULT_MODEL_PATH: &str = "models/final.onnx";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub model_path: PathBuf,
    pub model_format: ModelFormat,
    pub upload_dir: PathBuf,
    pub upload_limit_bytes: usize,
    #[cfg(feature = "tch-backend")]
    pub device: Device,
}

impl Default for AppConfig {
    fn default() -> Self {
        let model_path = PathBuf::from(DEFAULT_MODEL_PATH);
        let model_format = ModelFormat::from_path(&model_path).unwrap_or_default();
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            model_path,
            model_format,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            #[cfg(feature = "tch-backend")]
            device: Device::Cpu,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// Builds the config from `lookup`, keeping the default for any variable
    /// that is unset or does not parse.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = lookup("SERVER_ADDR")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.listen_addr);

        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let inferred_format = ModelFormat::from_path(&model_path).unwrap_or_default();
        let model_format = match lookup("MODEL_FORMAT") {
            Some(raw) => raw.parse::<ModelFormat>().unwrap_or_else(|err| {
                tracing::warn!(%err, fallback = %inferred_format, "ignoring MODEL_FORMAT");
                inferred_format
            }),
            None => inferred_format,
        };

        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let upload_limit_bytes = lookup("UPLOAD_LIMIT_BYTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.upload_limit_bytes);

        #[cfg(feature = "tch-backend")]
        let device = {
            let raw = lookup("DEVICE").unwrap_or_else(|| "cpu".into());
            parse_device(&raw)
        };

        Self {
            listen_addr,
            model_path,
            model_format,
            upload_dir,
            upload_limit_bytes,
            #[cfg(feature = "tch-backend")]
            device,
        }
    }
}

#[cfg(feature = "tch-backend")]
fn parse_device(raw: &str) -> Device {
    let lower = raw.to_lowercase();
    if lower.starts_with("cuda") {
        let idx = lower
            .split(':')
            .nth(1)
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        if tch::Cuda::is_available() {
            Device::Cuda(idx)
        } else {
            Device::Cpu
        }
    } else {
        Device::Cpu
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_point_at_local_artifacts() {
        let config = AppConfig::default();
        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.model_path, PathBuf::from("models/final.onnx"));
        assert_eq!(config.model_format, ModelFormat::Onnx);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.upload_limit_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn overrides_come_from_variables() {
        let config = config_from(&[
            ("SERVER_ADDR", "0.0.0.0:9000"),
            ("MODEL_PATH", "/srv/models/retina.pt"),
            ("UPLOAD_DIR", "/tmp/retina-uploads"),
            ("UPLOAD_LIMIT_BYTES", "1024"),
        ]);

        assert_eq!(config.listen_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.model_path, PathBuf::from("/srv/models/retina.pt"));
        assert_eq!(config.model_format, ModelFormat::TorchScript);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/retina-uploads"));
        assert_eq!(config.upload_limit_bytes, 1024);
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("SERVER_ADDR", "not an address"),
            ("UPLOAD_LIMIT_BYTES", "lots"),
        ]);

        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.upload_limit_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn explicit_model_format_wins_over_extension() {
        let config = config_from(&[
            ("MODEL_PATH", "models/final.bin"),
            ("MODEL_FORMAT", "torchscript"),
        ]);
        assert_eq!(config.model_format, ModelFormat::TorchScript);
    }

    #[test]
    fn unknown_model_format_falls_back_to_extension() {
        let config = config_from(&[
            ("MODEL_PATH", "models/final.pt"),
            ("MODEL_FORMAT", "keras"),
        ]);
        assert_eq!(config.model_format, ModelFormat::TorchScript);

        let config = config_from(&[("MODEL_FORMAT", "keras")]);
        assert_eq!(config.model_format, ModelFormat::Onnx);
    }
}
