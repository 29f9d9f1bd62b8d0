//! Error taxonomy for the inference core
//!
//! Every failure the core can report is a [`ServiceError`] variant with a
//! stable machine-readable [`ServiceError::reason`] code. The HTTP layer maps
//! these codes to status codes; the core itself never decides transport.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single feature attribute was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    NonNumeric,
    OutOfRange,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Missing => write!(f, "missing"),
            IssueKind::NonNumeric => write!(f, "non-numeric"),
            IssueKind::OutOfRange => write!(f, "out-of-range"),
        }
    }
}

/// One offending attribute of a rejected feature vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub kind: IssueKind,
}

/// Rejection of a raw feature mapping, listing every offending attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Kind reported for `field`, if it was rejected
    pub fn kind_of(&self, field: &str) -> Option<IssueKind> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.kind)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid feature vector:")?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{} is {}", sep, issue.field, issue.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the registry, router, metrics store and simulator
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("model '{0}' not loaded")]
    ModelNotFound(String),

    #[error("no models found in {}; run the training pipeline first", .0.display())]
    NoModelsAvailable(PathBuf),

    #[error("invalid model artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("metrics not found at {}", .0.display())]
    MetricsUnavailable(PathBuf),

    #[error("dataset unavailable: {0}")]
    DatasetUnavailable(String),

    #[error("corrupt file {}: {reason}", .path.display())]
    CorruptFile { path: PathBuf, reason: String },
}

impl ServiceError {
    /// Stable code identifying the failure class
    pub fn reason(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::ModelNotFound(_) => "model_not_found",
            ServiceError::NoModelsAvailable(_) => "no_models_available",
            ServiceError::InvalidArtifact { .. } => "invalid_artifact",
            ServiceError::MetricsUnavailable(_) => "metrics_unavailable",
            ServiceError::DatasetUnavailable(_) => "dataset_unavailable",
            ServiceError::CorruptFile { .. } => "corrupt_file",
        }
    }

    /// True when the caller can fix the request and retry
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_) | ServiceError::ModelNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
