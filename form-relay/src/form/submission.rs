//! Validated form submissions and email body assembly.

use std::collections::BTreeMap;

use serde_json::Value;

use super::ExpectedFields;

/// One decoded form submission: field name to string value.
///
/// Lives for a single request and is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    fields: BTreeMap<String, String>,
}

impl Submission {
    /// Project a decoded JSON object onto string values.
    ///
    /// Returns `None` when `decoded` is not an object or any value is not a
    /// JSON string.
    pub fn project(decoded: &Value) -> Option<Self> {
        let fields = decoded
            .as_object()?
            .iter()
            .map(|(name, value)| value.as_str().map(|v| (name.clone(), v.to_owned())))
            .collect::<Option<BTreeMap<_, _>>>()?;

        Some(Self { fields })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the plaintext email body, one `name: value` line per field.
    ///
    /// Lines follow the configured field order and values are trimmed.
    pub fn compose_body(&self, expected: &ExpectedFields) -> String {
        let mut body = String::new();
        for name in expected.iter() {
            if let Some(value) = self.get(name) {
                body.push_str(name);
                body.push_str(": ");
                body.push_str(value.trim());
                body.push('\n');
            }
        }
        body
    }
}
