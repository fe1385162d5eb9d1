//! Typed worker parameters.
//!
//! A worker declares a schema of [`ParameterSpec`]s. Before a run, the
//! configuration overrides for that worker are checked against the schema and
//! merged with defaults into a [`Parameters`] map, which the worker reads
//! through its context. Workers never read configuration or the process
//! environment themselves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use surveyor_core::ParameterValue;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float; integer values are accepted and widened
    Float,
    /// Boolean flag
    Boolean,
}

impl ParameterKind {
    /// Check a value against this type, widening integers to floats.
    ///
    /// Returns `None` if the value has an incompatible type.
    #[must_use]
    pub fn coerce(&self, value: &ParameterValue) -> Option<ParameterValue> {
        match (self, value) {
            (Self::String, ParameterValue::String(_))
            | (Self::Integer, ParameterValue::Integer(_))
            | (Self::Float, ParameterValue::Float(_))
            | (Self::Boolean, ParameterValue::Boolean(_)) => Some(value.clone()),
            (Self::Float, ParameterValue::Integer(_)) => value.as_f64().map(ParameterValue::Float),
            _ => None,
        }
    }

    /// Lowercase type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a worker's parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name, unique within the worker
    pub name: String,
    /// Declared type
    pub kind: ParameterKind,
    /// Value used when configuration does not override it
    #[serde(default)]
    pub default: Option<ParameterValue>,
    /// Whether a value must be present after resolution
    #[serde(default)]
    pub required: bool,
    /// Human-readable explanation
    #[serde(default)]
    pub description: String,
}

impl ParameterSpec {
    fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            required: false,
            description: String::new(),
        }
    }

    /// A string parameter.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::String)
    }

    /// An integer parameter.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Integer)
    }

    /// A float parameter.
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Float)
    }

    /// A boolean parameter.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Boolean)
    }

    /// Set the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<ParameterValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the parameter as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Resolved parameter values for one worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parameters(BTreeMap<String, ParameterValue>);

impl Parameters {
    pub(crate) fn from_map(values: BTreeMap<String, ParameterValue>) -> Self {
        Self(values)
    }

    /// Raw value lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    /// String parameter lookup.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParameterValue::as_str)
    }

    /// Integer parameter lookup.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParameterValue::as_i64)
    }

    /// Float parameter lookup.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParameterValue::as_f64)
    }

    /// Boolean parameter lookup.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParameterValue::as_bool)
    }

    /// Number of resolved values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no values were resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
