//! Prediction engine: input validation, scaling and routing

mod features;
mod router;
mod scaler;

pub use features::{FEATURE_MAX, FEATURE_MIN};
pub use router::{needs_scaling, PredictionRouter, RouterStats};
pub use scaler::{ScalerData, StandardScaler};
