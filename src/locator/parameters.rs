/// Parameter bundle handed to factory constructors at resolution time.
///
/// The registry passes it through untouched. Which keys mean what is a
/// contract between a factory and its callers; the `require_*` helpers
/// give factories a uniform way to report `InsufficientParameters`.

use serde_json::{Map, Value};

use super::error::RegistryError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Map<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(Value::as_u64)
    }

    pub fn require_str(&self, key: &str) -> Result<&str, RegistryError> {
        self.get_str(key)
            .ok_or_else(|| RegistryError::InsufficientParameters {
                reason: format!("expected string parameter '{}'", key),
            })
    }

    pub fn require_u64(&self, key: &str) -> Result<u64, RegistryError> {
        self.get_u64(key)
            .ok_or_else(|| RegistryError::InsufficientParameters {
                reason: format!("expected unsigned integer parameter '{}'", key),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
