//! Stream simulation
//!
//! Emulates a live feed by replaying the first rows of the reference dataset
//! and labelling each one with every loaded model. Stateless: the same `n`
//! always yields the same items.

use super::Dataset;
use crate::error::Result;
use crate::models::StreamItem;
use crate::predictor::PredictionRouter;
use std::sync::Arc;
use tracing::debug;

/// Rows to read for a request of `requested`: at least one, and never more
/// than the dataset holds (reading stops at end of file)
pub fn clamp_rows(requested: i64) -> usize {
    usize::try_from(requested.max(1)).unwrap_or(usize::MAX)
}

pub struct StreamSimulator {
    router: Arc<PredictionRouter>,
    dataset: Dataset,
}

impl StreamSimulator {
    pub fn new(router: Arc<PredictionRouter>, dataset: Dataset) -> Self {
        Self { router, dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Label the first `min(max(1, n), dataset size)` rows with every model
    pub fn simulate(&self, n: i64) -> Result<Vec<StreamItem>> {
        let rows = self.dataset.read_prefix(clamp_rows(n))?;
        let registry = self.router.registry();

        let items: Vec<StreamItem> = rows
            .into_iter()
            .map(|row| StreamItem {
                pred: registry
                    .entries()
                    .map(|entry| {
                        (
                            entry.name().to_string(),
                            self.router.label(entry, &row.features),
                        )
                    })
                    .collect(),
                features: row.features,
            })
            .collect();

        debug!(requested = n, rows = items.len(), "Simulated stream");
        Ok(items)
    }
}
