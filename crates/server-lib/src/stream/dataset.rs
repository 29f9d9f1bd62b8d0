//! Reference dataset reader
//!
//! CSV with a header row naming at least the four feature columns (in any
//! order). The `qualityGrade` label column is optional.

use crate::error::{Result, ServiceError};
use crate::models::{FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Header of the ground-truth label column
pub const LABEL_COLUMN: &str = "qualityGrade";

/// One validated dataset row
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub features: FeatureVector,
    pub grade: Option<String>,
}

/// Column positions resolved from the header row
struct Columns {
    features: [usize; NUM_FEATURES],
    label: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let mut features = [0; NUM_FEATURES];
        for (slot, name) in features.iter_mut().zip(FEATURE_NAMES) {
            *slot = position(name).ok_or_else(|| {
                ServiceError::DatasetUnavailable(format!("missing column '{}'", name))
            })?;
        }

        Ok(Self {
            features,
            label: position(LABEL_COLUMN),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
}

impl Dataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// First `limit` rows; fewer when the file is shorter
    ///
    /// Rows past `limit` are never parsed.
    pub fn read_prefix(&self, limit: usize) -> Result<Vec<DatasetRow>> {
        let file = File::open(&self.path).map_err(|e| {
            ServiceError::DatasetUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        read_rows(BufReader::new(file), Some(limit))
    }

    pub fn read_all(&self) -> Result<Vec<DatasetRow>> {
        let file = File::open(&self.path).map_err(|e| {
            ServiceError::DatasetUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        read_rows(BufReader::new(file), None)
    }
}

fn read_rows<R: Read>(source: R, limit: Option<usize>) -> Result<Vec<DatasetRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| ServiceError::DatasetUnavailable(format!("unreadable header: {}", e)))?
        .clone();
    let columns = Columns::resolve(&headers)?;

    let mut rows = Vec::new();
    // Line 1 is the header
    let records = reader.records().take(limit.unwrap_or(usize::MAX));
    for (line, record) in (2..).zip(records) {
        let record = record
            .map_err(|e| ServiceError::DatasetUnavailable(format!("line {}: {}", line, e)))?;
        rows.push(parse_row(&record, &columns, line)?);
    }
    Ok(rows)
}

fn parse_row(record: &StringRecord, columns: &Columns, line: usize) -> Result<DatasetRow> {
    let raw: Map<String, Value> = FEATURE_NAMES
        .iter()
        .zip(columns.features)
        .filter_map(|(name, idx)| {
            record
                .get(idx)
                .map(|cell| (name.to_string(), Value::String(cell.to_string())))
        })
        .collect();

    let features = FeatureVector::from_raw(&raw)
        .map_err(|e| ServiceError::DatasetUnavailable(format!("line {}: {}", line, e)))?;
    let grade = columns
        .label
        .and_then(|idx| record.get(idx))
        .filter(|cell| !cell.is_empty())
        .map(str::to_string);

    Ok(DatasetRow { features, grade })
}
