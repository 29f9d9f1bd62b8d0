//! Feature vector validation
//!
//! Turns a raw attribute mapping (as received over the wire or read from the
//! reference dataset) into a [`FeatureVector`]. Validation is all-or-nothing:
//! every attribute must be present, numeric and inside [`FEATURE_MIN`,
//! `FEATURE_MAX`], and every offending attribute is reported at once.

use crate::error::{FieldIssue, IssueKind, ValidationError};
use crate::models::{FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use ndarray::Array1;
use serde_json::{Map, Value};

/// Lower bound of every feature attribute (inclusive)
pub const FEATURE_MIN: f64 = 0.0;

/// Upper bound of every feature attribute (inclusive)
pub const FEATURE_MAX: f64 = 100.0;

impl FeatureVector {
    /// Build a vector from already-numeric values, checking bounds
    pub fn new(
        drc_percentage: f64,
        moisture_content: f64,
        impurities: f64,
        color_score: f64,
    ) -> Result<Self, ValidationError> {
        let values = [drc_percentage, moisture_content, impurities, color_score];
        let issues: Vec<FieldIssue> = FEATURE_NAMES
            .into_iter()
            .zip(values)
            .filter(|(_, value)| !in_range(*value))
            .map(|(field, _)| FieldIssue {
                field,
                kind: IssueKind::OutOfRange,
            })
            .collect();

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }
        Ok(Self::from_values(values))
    }

    /// Validate a raw attribute mapping
    ///
    /// Numbers and numeric strings are accepted; extra attributes are ignored.
    pub fn from_raw(raw: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut values = [0.0; NUM_FEATURES];
        let mut issues = Vec::new();

        for (slot, field) in values.iter_mut().zip(FEATURE_NAMES) {
            match raw.get(field).map(coerce) {
                None => issues.push(FieldIssue {
                    field,
                    kind: IssueKind::Missing,
                }),
                Some(Err(kind)) => issues.push(FieldIssue { field, kind }),
                Some(Ok(value)) => *slot = value,
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }
        Ok(Self::from_values(values))
    }

    /// Single-row inference input
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.values().to_vec())
    }

    fn from_values(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            drc_percentage: values[0],
            moisture_content: values[1],
            impurities: values[2],
            color_score: values[3],
        }
    }
}

impl TryFrom<Map<String, Value>> for FeatureVector {
    type Error = ValidationError;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_raw(&raw)
    }
}

fn in_range(value: f64) -> bool {
    value.is_finite() && (FEATURE_MIN..=FEATURE_MAX).contains(&value)
}

fn coerce(value: &Value) -> Result<f64, IssueKind> {
    let number = match value {
        Value::Number(n) => n.as_f64().ok_or(IssueKind::NonNumeric)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| IssueKind::NonNumeric)?,
        _ => return Err(IssueKind::NonNumeric),
    };

    if in_range(number) {
        Ok(number)
    } else {
        Err(IssueKind::OutOfRange)
    }
}
