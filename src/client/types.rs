//! Reporting backend wire types
//!
//! Field names follow the Search Console API (camelCase). Row metrics
//! are kept as raw JSON so they can pass through to records untouched.

use crate::stream::Dimension;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Permission level the backend reports for sites the account cannot read
pub const UNVERIFIED_PERMISSION: &str = "siteUnverifiedUser";

/// A site (property) visible to the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    pub permission_level: String,
}

impl SiteEntry {
    pub fn new(site_url: impl Into<String>, permission_level: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            permission_level: permission_level.into(),
        }
    }
}

/// Body of a search analytics query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u32>,
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Absent when the query matched nothing
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_aggregation_type: Option<String>,
}

/// One result row: positional dimension values plus metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub keys: Vec<String>,
    /// clicks, impressions, ctr, position
    #[serde(flatten)]
    pub metrics: Map<String, Value>,
}

impl Row {
    /// Row with keys and no metrics
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            metrics: Map::new(),
        }
    }

    /// Builder method: add a metric
    pub fn metric(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }
}

/// Response of the site listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SitesResponse {
    #[serde(default)]
    pub site_entry: Vec<SiteEntry>,
}
