//! Record shaping
//!
//! Turns a backend row (dimension values by position) into a flat record
//! keyed by dimension name.

use super::dimension::Dimension;
use super::error::ShapeError;
use crate::client::Row;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record field holding the window start date
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Record field holding the site identifier
pub const SITE_URL_FIELD: &str = "site_url";

/// Flat output record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field value as a string, if it is one
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Shape one row into a record.
///
/// Metrics carried by the row are kept; dimension values, the window
/// start date and the site identifier are layered on top.
pub fn shape_record(
    row: Row,
    dimensions: &[Dimension],
    window_start: NaiveDate,
    site_url: &str,
) -> Result<Record, ShapeError> {
    if row.keys.len() != dimensions.len() {
        return Err(ShapeError::DimensionCount {
            expected: dimensions.len(),
            actual: row.keys.len(),
        });
    }

    let mut fields = row.metrics;
    for (dim, value) in dimensions.iter().zip(row.keys) {
        fields.insert(dim.as_str().to_string(), Value::String(value));
    }
    fields.insert(
        TIMESTAMP_FIELD.to_string(),
        Value::String(window_start.format("%Y-%m-%d").to_string()),
    );
    fields.insert(
        SITE_URL_FIELD.to_string(),
        Value::String(site_url.to_string()),
    );

    Ok(Record(fields))
}
