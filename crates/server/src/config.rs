//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `QUALITY_API_PORT`
pub const ENV_PREFIX: &str = "QUALITY";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Name attached to structured log events
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding `<model>_model.json` and `scaler.json`
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    #[serde(default = "default_metrics_file")]
    pub metrics_file: PathBuf,

    /// Reference dataset replayed by `/sample-stream`
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Rows returned by `/sample-stream` when `n` is not given
    #[serde(default = "default_stream_rows")]
    pub default_stream_rows: i64,
}

fn default_service_name() -> String {
    "quality-api".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_metrics_file() -> PathBuf {
    PathBuf::from("models/model_metrics.json")
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("datasets/balanced_quality_dataset.csv")
}

fn default_stream_rows() -> i64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            metrics_file: default_metrics_file(),
            dataset_path: default_dataset_path(),
            default_stream_rows: default_stream_rows(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `QUALITY_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}
