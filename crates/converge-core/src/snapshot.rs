//! Status extraction from resource snapshots
//!
//! The watcher never looks inside a snapshot itself. Callers hand it a typed
//! extractor, usually a closure over their decoded model:
//!
//! ```rust
//! use converge_core::SnapshotError;
//!
//! struct Volume {
//!     status: Option<String>,
//! }
//!
//! let extract = |volume: &Volume| {
//!     volume
//!         .status
//!         .clone()
//!         .ok_or_else(|| SnapshotError::Missing("status".to_string()))
//! };
//!
//! let volume = Volume { status: Some("available".to_string()) };
//! assert_eq!(extract(&volume).unwrap(), "available");
//! ```
//!
//! For untyped JSON bodies, [`JsonPointer`] does the same job.

use serde_json::Value;
use thiserror::Error;

/// Why a status could not be read from a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("status field '{0}' is missing")]
    Missing(String),

    #[error("status field '{field}' is not a string (found {found})")]
    NotAString { field: String, found: String },
}

/// Locates a string field inside a JSON document
///
/// Accepts RFC 6901 pointers (`/status/state`) or dotted paths
/// (`status.state`), which are converted to pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer(String);

impl JsonPointer {
    pub fn new(path: &str) -> Self {
        if path.is_empty() || path.starts_with('/') {
            return Self(path.to_string());
        }
        let pointer = path
            .split('.')
            .map(|segment| segment.replace('~', "~0").replace('/', "~1"))
            .fold(String::new(), |mut acc, segment| {
                acc.push('/');
                acc.push_str(&segment);
                acc
            });
        Self(pointer)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw value at this pointer, whatever its type
    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        value.pointer(&self.0)
    }

    /// The string at this pointer
    pub fn extract(&self, value: &Value) -> Result<String, SnapshotError> {
        match self.lookup(value) {
            None | Some(Value::Null) => Err(SnapshotError::Missing(self.0.clone())),
            Some(Value::String(status)) => Ok(status.clone()),
            Some(other) => Err(SnapshotError::NotAString {
                field: self.0.clone(),
                found: json_type(other).to_string(),
            }),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
