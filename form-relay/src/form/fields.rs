//! Exact field-set validation.
//!
//! A submission passes only when its keys are exactly the configured field
//! names: nothing missing, nothing extra.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::config::ConfigError;

/// The configured form field names.
///
/// Names are unique and non-empty. The configured order is kept and used when
/// the email body is assembled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct ExpectedFields {
    names: Vec<String>,
}

impl ExpectedFields {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    // Forms have a handful of fields, a linear scan is fine.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl TryFrom<Vec<String>> for ExpectedFields {
    type Error = ConfigError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        if names.is_empty() {
            return Err(ConfigError::NoExpectedFields);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.is_empty() {
                return Err(ConfigError::EmptyFieldName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateField(name.clone()));
            }
        }

        Ok(Self { names })
    }
}

/// Check that `decoded` is an object whose key set equals `expected`.
///
/// Returns `false` for arrays, scalars and null, for objects with a different
/// number of keys, and for objects carrying any key outside the schema.
pub fn validate(decoded: &Value, expected: &ExpectedFields) -> bool {
    let Some(object) = decoded.as_object() else {
        return false;
    };

    if object.len() != expected.len() {
        return false;
    }

    object.keys().all(|key| expected.contains(key))
}
