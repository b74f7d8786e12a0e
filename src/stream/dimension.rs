//! Dimensions and stream definitions
//!
//! A stream is identified by the ordered list of dimensions it groups
//! rows by. The list doubles as the key properties of the emitted
//! records.

use super::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical axis the backend can group rows by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Country,
    Page,
    Query,
    Device,
    Date,
}

impl Dimension {
    /// All dimensions in canonical order
    pub fn all() -> &'static [Dimension] {
        &[
            Dimension::Country,
            Dimension::Page,
            Dimension::Query,
            Dimension::Device,
            Dimension::Date,
        ]
    }

    /// Field name used in queries and records
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Country => "country",
            Dimension::Page => "page",
            Dimension::Query => "query",
            Dimension::Device => "device",
            Dimension::Date => "date",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::all()
            .iter()
            .copied()
            .find(|dim| dim.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownDimension(s.to_string()))
    }
}

/// One configured extraction unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDefinition {
    dimensions: Vec<Dimension>,
    id: String,
}

impl StreamDefinition {
    /// Separator between dimension names in the stream identifier
    pub const ID_SEPARATOR: &'static str = "_";

    /// Build a stream from dimensions, dropping repeats but keeping order.
    /// An empty list selects every dimension.
    pub fn new(dimensions: impl IntoIterator<Item = Dimension>) -> Self {
        let mut unique: Vec<Dimension> = Vec::new();
        for dim in dimensions {
            if !unique.contains(&dim) {
                unique.push(dim);
            }
        }

        if unique.is_empty() {
            unique = Dimension::all().to_vec();
        }

        let id = unique
            .iter()
            .map(Dimension::as_str)
            .collect::<Vec<_>>()
            .join(Self::ID_SEPARATOR);

        Self {
            dimensions: unique,
            id,
        }
    }

    /// Parse configured dimension names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigurationError> {
        let dimensions = names
            .iter()
            .map(|name| name.as_ref().parse::<Dimension>())
            .collect::<Result<Vec<_>, _>>()?;

        if dimensions.is_empty() {
            tracing::info!(
                "no dimensions specified in config, defaulting to all dimensions"
            );
        }

        Ok(Self::new(dimensions))
    }

    /// Stream identifier, e.g. `country_page`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Record key properties (the dimension names)
    pub fn key_properties(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.to_string()).collect()
    }
}
