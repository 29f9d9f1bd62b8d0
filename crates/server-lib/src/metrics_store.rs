//! Read-only access to the training pipeline's evaluation metrics

use crate::error::{Result, ServiceError};
use crate::models::MetricsRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Metrics side file, read fresh on every call
#[derive(Debug, Clone)]
pub struct MetricsStore {
    path: PathBuf,
}

impl MetricsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File content exactly as written by the training pipeline
    pub fn load(&self) -> Result<Value> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ServiceError::MetricsUnavailable(self.path.clone()));
            }
            Err(e) => return Err(self.corrupt(e.to_string())),
        };
        serde_json::from_str(&contents).map_err(|e| self.corrupt(e.to_string()))
    }

    /// Typed per-model view of the metrics
    pub fn records(&self) -> Result<BTreeMap<String, MetricsRecord>> {
        serde_json::from_value(self.load()?).map_err(|e| self.corrupt(e.to_string()))
    }

    fn corrupt(&self, reason: String) -> ServiceError {
        ServiceError::CorruptFile {
            path: self.path.clone(),
            reason,
        }
    }
}
