//! Disguise profiles loaded from static mapping data.
//!
//! The mapping is a JSON object whose keys are arbitrary profile names and
//! whose values are `{ "title": ..., "favicon": ... }` pairs.

pub mod loader;

use crate::accessor::Profile;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

pub use loader::{MappingLoader, MappingSource};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Read-only set of named profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainMapping {
    profiles: BTreeMap<String, Profile>,
}

impl DomainMapping {
    /// Validate the top-level shape and collect the profiles.
    ///
    /// Entries that are not objects are skipped. Object entries are kept as
    /// they are, missing fields included.
    pub fn from_value(value: Value) -> Result<Self, MappingError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(MappingError::NotAnObject(json_kind(&other))),
        };

        let mut profiles = BTreeMap::new();
        for (key, raw) in map {
            if !raw.is_object() {
                warn!(profile = %key, "skipping mapping entry that is not an object");
                continue;
            }
            match serde_json::from_value::<Profile>(raw) {
                Ok(profile) => {
                    profiles.insert(key, profile);
                }
                Err(e) => warn!(profile = %key, "skipping unreadable mapping entry: {e}"),
            }
        }
        Ok(Self { profiles })
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn get(&self, key: &str) -> Option<&Profile> {
        self.profiles.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The value set draws are made from.
    pub fn profiles(&self) -> Vec<&Profile> {
        self.profiles.values().collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
