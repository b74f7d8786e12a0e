//! Tap State
//!
//! The persisted state is an opaque JSON object. This crate only owns
//! the bookmark entries:
//!
//! ```text
//! {"bookmarks": {"<stream_id>": {"timestamp": "2021-01-03"}}, ...}
//! ```
//!
//! Every other key passes through unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

const BOOKMARKS_KEY: &str = "bookmarks";

/// Opaque state object carrying per-stream bookmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TapState(Value);

impl Default for TapState {
    fn default() -> Self {
        Self::new()
    }
}

impl TapState {
    /// Empty state
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wrap a state object read from elsewhere
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        match value {
            Value::Object(_) => Ok(Self(value)),
            Value::Null => Ok(Self::new()),
            other => Err(StateError::NotAnObject(type_name(&other))),
        }
    }

    /// Load state from a JSON file
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path).map_err(|e| StateError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: Value = serde_json::from_str(&content).map_err(|e| StateError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_value(value)
    }

    /// Bookmark value for a stream property
    pub fn get_bookmark(&self, stream_id: &str, property: &str) -> Option<&str> {
        self.0
            .get(BOOKMARKS_KEY)?
            .get(stream_id)?
            .get(property)?
            .as_str()
    }

    /// Set a bookmark value, creating intermediate objects as needed.
    /// Non-object entries on the way are replaced.
    pub fn set_bookmark(&mut self, stream_id: &str, property: &str, value: &str) {
        let mut root = into_object(std::mem::take(&mut self.0));
        let mut bookmarks = into_object(root.remove(BOOKMARKS_KEY).unwrap_or_default());
        let mut stream = into_object(bookmarks.remove(stream_id).unwrap_or_default());

        stream.insert(property.to_string(), Value::String(value.to_string()));
        bookmarks.insert(stream_id.to_string(), Value::Object(stream));
        root.insert(BOOKMARKS_KEY.to_string(), Value::Object(bookmarks));
        self.0 = Value::Object(root);
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Object contents of a value; anything else becomes an empty object
fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors that can occur when loading state
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read state file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse state file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("State must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
