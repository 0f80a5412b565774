//! Header-keyword store access.
//!
//! The fitting tool's parameter store is consumed through the [`HeaderStore`]
//! trait so the engine never assumes a schema: keys are opaque strings and
//! every payload is either a scalar or a two-element confidence-bound pair.
//! [`JsonHeaderStore`] reads the materialized form the batch tooling writes
//! next to each text dump.

use crate::domain::PostError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Payload of one store column's first row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreValue {
    Scalar(f64),
    Pair([f64; 2]),
}

/// Opaque flat catalog of keyword → payload, one logical record per fit.
pub trait HeaderStore {
    fn keys(&self) -> Vec<&str>;
    fn value(&self, key: &str) -> Option<StoreValue>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read header store '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse header store '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("header store '{path}' is not a key/value object")]
    NotAnObject { path: PathBuf },
    #[error(
        "header store '{path}' key '{key}' holds an unsupported payload \
         (expected a number or a two-element bound pair)"
    )]
    UnsupportedPayload { path: PathBuf, key: String },
}

impl From<StoreError> for PostError {
    fn from(error: StoreError) -> Self {
        let message = error.to_string();
        match &error {
            StoreError::Read { source, .. } if source.kind() == ErrorKind::NotFound => {
                PostError::artifact_not_found(message)
            }
            StoreError::Read { .. } => PostError::io_system("IO.STORE_READ", message),
            StoreError::Parse { .. }
            | StoreError::NotAnObject { .. }
            | StoreError::UnsupportedPayload { .. } => {
                PostError::input_validation("INPUT.STORE_FORMAT", message)
            }
        }
    }
}

/// Header store materialized as a JSON object of scalars and bound pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonHeaderStore {
    entries: BTreeMap<String, StoreValue>,
}

impl JsonHeaderStore {
    /// Loads a store wholesale from disk; no partial reads.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let Value::Object(fields) = document else {
            return Err(StoreError::NotAnObject {
                path: path.to_path_buf(),
            });
        };

        let mut entries = BTreeMap::new();
        for (key, value) in fields {
            let payload = store_value(&value).ok_or_else(|| StoreError::UnsupportedPayload {
                path: path.to_path_buf(),
                key: key.clone(),
            })?;
            entries.insert(key, payload);
        }
        Ok(Self { entries })
    }

    /// In-memory construction, used by tests and by callers that already
    /// hold a decoded record.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, StoreValue)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl HeaderStore for JsonHeaderStore {
    fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    fn value(&self, key: &str) -> Option<StoreValue> {
        self.entries.get(key).copied()
    }
}

fn store_value(value: &Value) -> Option<StoreValue> {
    match value {
        Value::Number(number) => number.as_f64().map(StoreValue::Scalar),
        Value::Array(items) if items.len() == 2 => {
            let first = items[0].as_f64()?;
            let second = items[1].as_f64()?;
            Some(StoreValue::Pair([first, second]))
        }
        _ => None,
    }
}
