//! `qc` subcommands

pub mod metrics;
pub mod models;
pub mod predict;
pub mod stream;
