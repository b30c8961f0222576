//! Server configuration

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from `EFFICIENCY_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Fitted model artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Feature transform artifact (encoding table plus scaler)
    #[serde(default = "default_scaler_path")]
    pub scaler_path: PathBuf,

    /// Upper bound on one prediction, in milliseconds
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
}

fn default_port() -> u16 {
    5002
}

fn default_model_path() -> PathBuf {
    PathBuf::from("artifacts/models/model.bin")
}

fn default_scaler_path() -> PathBuf {
    PathBuf::from("artifacts/processed/scaler.bin")
}

fn default_inference_timeout_ms() -> u64 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            model_path: default_model_path(),
            scaler_path: default_scaler_path(),
            inference_timeout_ms: default_inference_timeout_ms(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// A malformed value (say a non-numeric port) is an error rather than a
    /// silent fallback to the default.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("EFFICIENCY"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5002);
        assert_eq!(config.model_path, PathBuf::from("artifacts/models/model.bin"));
        assert_eq!(
            config.scaler_path,
            PathBuf::from("artifacts/processed/scaler.bin")
        );
        assert_eq!(config.inference_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_empty_source_uses_defaults() {
        let config: ServerConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.port, 5002);
        assert_eq!(config.inference_timeout_ms, 100);
    }
}
