//! A thin newtype over a JSON object used for the runtime variable map,
//! telemetry payloads, and lead submission data.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Ordered string-keyed JSON map.
///
/// Values are freeform JSON; consumers coerce with [`Vars::number`] and
/// [`Vars::string`] the way the condition and set-variable executors need.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vars(Map<String, Value>);

impl Vars {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert.
    pub fn with<T: Serialize>(
        mut self,
        key: &str,
        value: T,
    ) -> Self {
        self.set(key, value);
        self
    }

    /// Insert a serializable value under `key`.
    pub fn set<T: Serialize>(
        &mut self,
        key: &str,
        value: T,
    ) {
        if let Ok(v) = serde_json::to_value(value) {
            self.0.insert(key.to_string(), v);
        }
    }

    /// Insert a raw JSON value under `key`.
    pub fn insert(
        &mut self,
        key: String,
        value: Value,
    ) {
        self.0.insert(key, value);
    }

    /// Get a typed value by key.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.0.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a raw JSON value by key.
    pub fn get_value(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Coerce the value under `key` to a number, defaulting to 0.
    ///
    /// Strings are parsed, booleans map to 0/1, everything else is 0.
    pub fn number(
        &self,
        key: &str,
    ) -> f64 {
        self.0.get(key).map(coerce_number).unwrap_or(0.0)
    }

    /// Coerce the value under `key` to a string, defaulting to empty.
    pub fn string(
        &self,
        key: &str,
    ) -> String {
        self.0.get(key).map(coerce_string).unwrap_or_default()
    }
}

/// Number coercion shared by the condition and set-variable executors.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// String coercion shared by the condition executor and input validation.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        v => v.to_string(),
    }
}

impl From<Value> for Vars {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.0)
    }
}

impl std::fmt::Display for Vars {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}
