//! Replay of the reference dataset through every loaded model

mod dataset;
mod simulator;

pub use dataset::{Dataset, DatasetRow, LABEL_COLUMN};
pub use simulator::{clamp_rows, StreamSimulator};
