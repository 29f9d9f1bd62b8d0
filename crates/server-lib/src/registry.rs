//! Model registry
//!
//! Built once at startup from the model store directory and shared read-only
//! (behind an `Arc`) for the lifetime of the process.

use crate::classifiers::{Classifier, Classify};
use crate::error::{Result, ServiceError};
use crate::models::ModelName;
use crate::predictor::StandardScaler;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Scaler artifact file name inside the model store
pub const SCALER_FILE_NAME: &str = "scaler.json";

/// One loaded, servable model
#[derive(Debug, Clone)]
pub struct ModelEntry {
    name: ModelName,
    classifier: Classifier,
}

impl ModelEntry {
    pub fn new(name: ModelName, classifier: Classifier) -> Self {
        Self { name, classifier }
    }

    pub fn name(&self) -> ModelName {
        self.name
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn requires_scaling(&self) -> bool {
        self.name.requires_scaling()
    }

    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }
}

/// Loaded models plus the optional shared scaler
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: BTreeMap<ModelName, ModelEntry>,
    scaler: Option<StandardScaler>,
}

impl ModelRegistry {
    /// Load every known model and the scaler from `dir`
    ///
    /// Missing files are skipped. A present file that fails to parse is
    /// fatal, as is ending up with no models at all.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut entries = Vec::new();

        for name in ModelName::ALL {
            let path = dir.join(name.artifact_file_name());
            let Some(json) = read_optional(&path)? else {
                debug!(model = %name, path = %path.display(), "Model artifact not found");
                continue;
            };

            let classifier = Classifier::from_json(&json).map_err(|reason| {
                ServiceError::InvalidArtifact {
                    path: path.clone(),
                    reason,
                }
            })?;
            if classifier.algorithm() != name {
                return Err(ServiceError::InvalidArtifact {
                    path,
                    reason: format!(
                        "artifact declares algorithm '{}'",
                        classifier.algorithm()
                    ),
                });
            }

            debug!(
                model = %name,
                classes = classifier.classes().len(),
                "Parsed model artifact"
            );
            entries.push(ModelEntry::new(name, classifier));
        }

        let scaler_path = dir.join(SCALER_FILE_NAME);
        let scaler = match read_optional(&scaler_path)? {
            Some(json) => Some(StandardScaler::from_json(&json).map_err(|reason| {
                ServiceError::InvalidArtifact {
                    path: scaler_path.clone(),
                    reason,
                }
            })?),
            None => None,
        };

        if entries.is_empty() {
            return Err(ServiceError::NoModelsAvailable(dir.to_path_buf()));
        }

        Ok(Self::from_entries(entries, scaler))
    }

    /// Build a registry from already constructed entries
    ///
    /// A later entry with the same name replaces an earlier one.
    pub fn from_entries(
        entries: impl IntoIterator<Item = ModelEntry>,
        scaler: Option<StandardScaler>,
    ) -> Self {
        let models = entries
            .into_iter()
            .map(|entry| (entry.name(), entry))
            .collect();
        Self { models, scaler }
    }

    /// Sorted names of loaded models
    pub fn list_models(&self) -> Vec<String> {
        self.models
            .keys()
            .map(|name| name.as_str().to_string())
            .collect()
    }

    /// Look up a model by its wire name
    pub fn get(&self, name: &str) -> Result<&ModelEntry> {
        name.parse::<ModelName>()
            .ok()
            .and_then(|model| self.models.get(&model))
            .ok_or_else(|| ServiceError::ModelNotFound(name.to_string()))
    }

    /// Loaded models in name order
    pub fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Loaded models that expect scaling but will receive raw features
    pub fn scaling_models_without_scaler(&self) -> Vec<ModelName> {
        if self.has_scaler() {
            return Vec::new();
        }
        self.models
            .keys()
            .copied()
            .filter(ModelName::requires_scaling)
            .collect()
    }
}

/// Read a file, mapping "not found" to `None`
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ServiceError::InvalidArtifact {
            path: PathBuf::from(path),
            reason: e.to_string(),
        }),
    }
}
