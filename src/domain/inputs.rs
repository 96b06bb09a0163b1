//! Stack input values and their secret handling.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input value replaced by the credential before it is sent to the platform.
pub const API_KEY_SENTINEL: &str = "API_KEY";

/// Placeholder shown in logs instead of secret values.
pub const MASK: &str = "***MASKED***";

/// Whether a field with this key holds a secret and must not be logged.
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    key.to_ascii_lowercase().contains("_key")
}

/// Copy of `value` with every object field whose key is secret replaced by
/// [`MASK`], at any depth.
#[must_use]
pub fn mask_secret_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let masked = if is_secret_key(key) {
                        Value::String(MASK.to_string())
                    } else {
                        mask_secret_fields(inner)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_secret_fields).collect()),
        other => other.clone(),
    }
}

/// Input values applied to a stack before its members are deployed.
///
/// Keys whose value was replaced by the credential are remembered and
/// always masked, whatever their name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackInputs {
    values: BTreeMap<String, Value>,
    #[serde(skip)]
    credential_keys: BTreeSet<String>,
}

impl StackInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse inputs from a JSON object. A lone `{"inputs": {...}}` wrapper is
    /// unwrapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not an object.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let value = match value {
            Value::Object(mut map) if map.len() == 1 && map.get("inputs").is_some_and(Value::is_object) => {
                map.remove("inputs").unwrap_or_default()
            }
            other => other,
        };
        serde_json::from_value(value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Keys of values that are literally the [`API_KEY_SENTINEL`].
    pub fn sentinel_keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, value)| value.as_str() == Some(API_KEY_SENTINEL))
            .map(|(key, _)| key.as_str())
    }

    /// Copy of these inputs with every sentinel value replaced by `credential`.
    #[must_use]
    pub fn with_credential(&self, credential: &str) -> Self {
        let values = self
            .values
            .iter()
            .map(|(key, value)| {
                let value = if value.as_str() == Some(API_KEY_SENTINEL) {
                    Value::String(credential.to_string())
                } else {
                    value.clone()
                };
                (key.clone(), value)
            })
            .collect();
        let credential_keys = self
            .credential_keys
            .iter()
            .cloned()
            .chain(self.sentinel_keys().map(ToOwned::to_owned))
            .collect();
        Self {
            values,
            credential_keys,
        }
    }

    /// JSON payload sent to the platform.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.values).unwrap_or_default()
    }

    /// JSON payload safe to log.
    #[must_use]
    pub fn masked(&self) -> Value {
        let mut masked = mask_secret_fields(&self.to_json());
        if let Value::Object(map) = &mut masked {
            for key in &self.credential_keys {
                if let Some(value) = map.get_mut(key) {
                    *value = Value::String(MASK.to_string());
                }
            }
        }
        masked
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}
