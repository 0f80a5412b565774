//! Discovery of fit parameters from the header-keyword store.
//!
//! Discovery is substring-based and silent: a fragment that matches nothing
//! contributes nothing to the catalog. Each non-unique fragment outcome is
//! reported as a [`KeywordDiagnostic`] so call sites can decide whether to
//! warn.

use crate::common::constants::{
    EMISSION_MEASURE_FACTOR, EMISSION_MEASURE_KEY, INTERNAL_KEY_MARKER, KEV_PER_MEGAKELVIN,
    TEMPERATURE_SCALE_KEY,
};
use crate::store::{HeaderStore, StoreValue};
use std::collections::BTreeMap;

/// One catalog entry: the store payload plus the fragment that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub value: StoreValue,
    pub fragment: String,
}

/// Outcome of one fragment's search, recorded when it was not exactly one
/// key: zero matches mean the query found nothing (silently, see module
/// docs), several matches mean the caller's term was not specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDiagnostic {
    pub fragment: String,
    pub matched_keys: Vec<String>,
}

impl KeywordDiagnostic {
    pub fn matched_nothing(&self) -> bool {
        self.matched_keys.is_empty()
    }
}

/// Everything one discovery pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDiscovery {
    pub catalog: HeaderCatalog,
    pub diagnostics: Vec<KeywordDiagnostic>,
}

/// Immutable keyword → payload catalog for one fit artifact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl HeaderCatalog {
    /// Scans the store's record for keys whose lower-cased form contains one
    /// of the fragments, skipping internal keys. Every match is retained
    /// under its exact key; when several fragments hit the same key the last
    /// one wins the attribution. The two conversion constants are always
    /// seeded.
    pub fn discover(store: &dyn HeaderStore, fragments: &[String]) -> CatalogDiscovery {
        let mut entries = BTreeMap::new();
        for (key, value) in [
            (EMISSION_MEASURE_KEY, EMISSION_MEASURE_FACTOR),
            (TEMPERATURE_SCALE_KEY, KEV_PER_MEGAKELVIN),
        ] {
            entries.insert(
                key.to_string(),
                CatalogEntry {
                    value: StoreValue::Scalar(value),
                    fragment: key.to_string(),
                },
            );
        }

        let keys = store.keys();
        let mut diagnostics = Vec::new();
        for fragment in fragments {
            let mut matched_keys = Vec::new();
            for key in &keys {
                if key.contains(INTERNAL_KEY_MARKER) {
                    continue;
                }
                if !key.to_ascii_lowercase().contains(fragment.as_str()) {
                    continue;
                }
                matched_keys.push((*key).to_string());
                if let Some(value) = store.value(key) {
                    entries.insert(
                        (*key).to_string(),
                        CatalogEntry {
                            value,
                            fragment: fragment.clone(),
                        },
                    );
                }
            }
            if matched_keys.len() != 1 {
                diagnostics.push(KeywordDiagnostic {
                    fragment: fragment.clone(),
                    matched_keys,
                });
            }
        }

        CatalogDiscovery {
            catalog: Self { entries },
            diagnostics,
        }
    }

    pub fn entry(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<f64> {
        match self.entries.get(key)?.value {
            StoreValue::Scalar(value) => Some(value),
            StoreValue::Pair(_) => None,
        }
    }

    pub fn bound_pair(&self, key: &str) -> Option<[f64; 2]> {
        match self.entries.get(key)?.value {
            StoreValue::Pair(pair) => Some(pair),
            StoreValue::Scalar(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The check-report view of the catalog: scalar values only, with the
    /// error keys (leading `E`) and the constant seeds filtered out.
    pub fn reportable_parameters(&self) -> Vec<(&str, f64)> {
        self.iter()
            .filter(|(key, _)| !key.starts_with('E'))
            .filter(|(key, _)| *key != EMISSION_MEASURE_KEY && *key != TEMPERATURE_SCALE_KEY)
            .filter_map(|(key, entry)| match entry.value {
                StoreValue::Scalar(value) => Some((key, value)),
                StoreValue::Pair(_) => None,
            })
            .collect()
    }
}
