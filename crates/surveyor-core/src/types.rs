//! Shared types used across Surveyor.
//!
//! This module defines common newtypes and enums that provide type safety
//! and clear domain modeling.

use crate::error::SurveyorError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Newtype for worker identifiers with validation.
///
/// Worker IDs are lowercase path-like names such as `dns/lookup` or
/// `http/spider`: segments of `[a-z0-9_.-]` separated by `/`, 1-64 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerId(String);

impl WorkerId {
    /// Create a new `WorkerId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, SurveyorError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), SurveyorError> {
        static WORKER_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = WORKER_REGEX.get_or_init(|| {
            Regex::new(r"^[a-z0-9][a-z0-9_.-]*(/[a-z0-9][a-z0-9_.-]*)*$").expect("valid regex")
        });

        if id.is_empty() || id.len() > 64 {
            return Err(SurveyorError::Validation(format!(
                "invalid worker ID: must be 1-64 characters, got {} characters",
                id.len()
            )));
        }

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(SurveyorError::Validation(format!(
                "invalid worker ID: must be lowercase path segments separated by '/', got '{id}'"
            )))
        }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for WorkerId {
    type Error = SurveyorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkerId> for String {
    fn from(id: WorkerId) -> Self {
        id.0
    }
}

impl FromStr for WorkerId {
    type Err = SurveyorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// How invasive a worker's probing is.
///
/// Ordered from least to most invasive so configuration can express a ceiling
/// (`worker.intensity <= scan.max_intensity`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    /// Only consults third-party data, never touches the target
    Passive,
    /// Light, well-behaved contact with the target (DNS, single requests)
    #[default]
    Normal,
    /// Heavy or noisy probing (port scans, brute forcing, spidering)
    Aggressive,
}

impl Intensity {
    /// Lowercase name as used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passive => "passive",
            Self::Normal => "normal",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = SurveyorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passive" => Ok(Self::Passive),
            "normal" => Ok(Self::Normal),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(SurveyorError::Validation(format!(
                "invalid intensity '{other}': expected passive, normal or aggressive"
            ))),
        }
    }
}

/// A typed worker parameter value, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// `true` / `false`
    Boolean(bool),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Free-form string
    String(String),
}

impl ParameterValue {
    /// Name of the value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    /// Borrow as a string, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer, if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a float. Integers widen losslessly where representable.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as a boolean, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for ParameterValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ParameterValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, SurveyorError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| SurveyorError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Milliseconds elapsed between `earlier` and `self` (zero if negative).
    #[must_use]
    pub fn millis_since(&self, earlier: &Timestamp) -> u64 {
        u64::try_from((self.0 - earlier.0).num_milliseconds()).unwrap_or(0)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_valid() {
        let valid_ids = vec![
            "dns",
            "dns/lookup",
            "http/spider",
            "cert.transparency/crtsh",
            "port_scan/tcp-connect",
        ];

        for id in valid_ids {
            assert!(WorkerId::new(id).is_ok(), "Failed for: {id}");
        }
    }

    #[test]
    fn test_worker_id_invalid() {
        let too_long = "a".repeat(65);
        let invalid_ids = vec![
            "",                // Empty
            "DNS/lookup",      // Uppercase
            "dns//lookup",     // Empty segment
            "/dns",            // Leading slash
            "dns/",            // Trailing slash
            "dns lookup",      // Space
            "-dns",            // Starts with hyphen
            too_long.as_str(), // Too long
        ];

        for id in invalid_ids {
            assert!(WorkerId::new(id).is_err(), "Should fail for: {id}");
        }
    }

    #[test]
    fn test_worker_id_serde_validates() {
        let id: WorkerId = serde_json::from_str("\"dns/lookup\"").expect("deserialize worker ID");
        assert_eq!(id.as_str(), "dns/lookup");

        assert!(serde_json::from_str::<WorkerId>("\"Not Valid\"").is_err());
    }

    #[test]
    fn test_intensity_ordering() {
        assert!(Intensity::Passive < Intensity::Normal);
        assert!(Intensity::Normal < Intensity::Aggressive);
        assert_eq!(Intensity::default(), Intensity::Normal);
    }

    #[test]
    fn test_intensity_parse() {
        assert_eq!(
            "Aggressive".parse::<Intensity>().expect("parse intensity"),
            Intensity::Aggressive
        );
        assert_eq!(
            " passive ".parse::<Intensity>().expect("parse intensity"),
            Intensity::Passive
        );
        assert!("loud".parse::<Intensity>().is_err());
    }

    #[test]
    fn test_parameter_value_untagged() {
        let values: Vec<ParameterValue> =
            serde_json::from_str(r#"[true, 12, 0.5, "text"]"#).expect("deserialize parameters");
        assert_eq!(
            values,
            vec![
                ParameterValue::Boolean(true),
                ParameterValue::Integer(12),
                ParameterValue::Float(0.5),
                ParameterValue::String("text".to_string()),
            ]
        );
    }

    #[test]
    fn test_parameter_value_accessors() {
        assert_eq!(ParameterValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(ParameterValue::Float(3.5).as_i64(), None);
        assert_eq!(ParameterValue::from("key").as_str(), Some("key"));
        assert_eq!(ParameterValue::from(true).as_bool(), Some(true));
        assert_eq!(ParameterValue::from(1.5).type_name(), "float");
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Timestamp::now();
        let parsed = Timestamp::from_rfc3339(&ts.to_rfc3339()).expect("parse RFC3339 timestamp");
        assert_eq!(ts.as_datetime().timestamp(), parsed.as_datetime().timestamp());
    }

    #[test]
    fn test_timestamp_millis_since() {
        let earlier = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").expect("parse earlier");
        let later = Timestamp::from_rfc3339("2026-01-01T00:00:01.500Z").expect("parse later");
        assert_eq!(later.millis_since(&earlier), 1500);
        assert_eq!(earlier.millis_since(&later), 0);
    }
}
