//! Explicit body matchers attached to a contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::Scalar;
use crate::error::EngineError;
use crate::path::JsonPath;

/// ISO-8601 date, `yyyy-MM-dd`.
pub const ISO_DATE: &str = r"(\d\d\d\d)-(0[1-9]|1[012])-(0[1-9]|[12][0-9]|3[01])";

/// ISO-8601 time, `HH:mm:ss`.
pub const ISO_TIME: &str = r"(2[0-3]|[01][0-9]):([0-5][0-9]):([0-5][0-9])";

/// ISO-8601 date-time without offset, `yyyy-MM-ddTHH:mm:ss`.
pub const ISO_DATE_TIME: &str = r"([0-9]{4})-(1[0-2]|0[1-9])-(3[01]|0[1-9]|[12][0-9])T(2[0-3]|[01][0-9]):([0-5][0-9]):([0-5][0-9])";

/// How a matcher verifies the value at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum MatchingType {
    Null,
    Equality,
    Type,
    Date,
    Time,
    Timestamp,
    Regex,
}

impl MatchingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchingType::Null => "NULL",
            MatchingType::Equality => "EQUALITY",
            MatchingType::Type => "TYPE",
            MatchingType::Date => "DATE",
            MatchingType::Time => "TIME",
            MatchingType::Timestamp => "TIMESTAMP",
            MatchingType::Regex => "REGEX",
        }
    }

    /// Kinds whose value is a regex.
    pub fn is_regex_based(&self) -> bool {
        matches!(
            self,
            MatchingType::Regex | MatchingType::Date | MatchingType::Time | MatchingType::Timestamp
        )
    }
}

impl fmt::Display for MatchingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchingType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NULL" => Ok(MatchingType::Null),
            "EQUALITY" => Ok(MatchingType::Equality),
            "TYPE" => Ok(MatchingType::Type),
            "DATE" => Ok(MatchingType::Date),
            "TIME" => Ok(MatchingType::Time),
            "TIMESTAMP" => Ok(MatchingType::Timestamp),
            "REGEX" => Ok(MatchingType::Regex),
            _ => Err(EngineError::UnsupportedMatcher {
                kind: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for MatchingType {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchingType> for String {
    fn from(value: MatchingType) -> Self {
        value.as_str().to_string()
    }
}

/// An explicit override claiming a path of the body.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub path: String,
    #[serde(rename = "type")]
    pub matching_type: MatchingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_occurrence: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurrence: Option<usize>,
}

impl Matcher {
    fn new(path: impl Into<String>, matching_type: MatchingType, value: Option<Scalar>) -> Self {
        Self {
            path: path.into(),
            matching_type,
            value,
            min_occurrence: None,
            max_occurrence: None,
        }
    }

    pub fn by_regex(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(path, MatchingType::Regex, Some(Scalar::String(pattern.into())))
    }

    pub fn by_equality(path: impl Into<String>) -> Self {
        Self::new(path, MatchingType::Equality, None)
    }

    pub fn by_type(path: impl Into<String>) -> Self {
        Self::new(path, MatchingType::Type, None)
    }

    pub fn by_type_with_occurrence(
        path: impl Into<String>,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Self {
        let mut matcher = Self::new(path, MatchingType::Type, None);
        matcher.min_occurrence = min;
        matcher.max_occurrence = max;
        matcher
    }

    pub fn by_date(path: impl Into<String>) -> Self {
        Self::new(path, MatchingType::Date, Some(ISO_DATE.into()))
    }

    pub fn by_time(path: impl Into<String>) -> Self {
        Self::new(path, MatchingType::Time, Some(ISO_TIME.into()))
    }

    pub fn by_timestamp(path: impl Into<String>) -> Self {
        Self::new(path, MatchingType::Timestamp, Some(ISO_DATE_TIME.into()))
    }

    pub fn by_null(path: impl Into<String>) -> Self {
        Self::new(path, MatchingType::Null, None)
    }

    /// The regex source, for regex-based kinds.
    pub fn regex(&self) -> Option<String> {
        if !self.matching_type.is_regex_based() {
            return None;
        }
        self.value.as_ref().map(ToString::to_string)
    }

    pub fn json_path(&self) -> Result<JsonPath, EngineError> {
        self.path.parse()
    }

    /// Check the matcher invariants: a parseable path, a pattern for REGEX,
    /// occurrence bounds only on TYPE, and a compilable regex.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.json_path()?;
        if self.matching_type != MatchingType::Type
            && (self.min_occurrence.is_some() || self.max_occurrence.is_some())
        {
            return Err(EngineError::OccurrenceOnNonType {
                path: self.path.clone(),
            });
        }
        if self.matching_type == MatchingType::Regex && self.value.is_none() {
            return Err(EngineError::MissingRegex {
                path: self.path.clone(),
            });
        }
        if let Some(pattern) = self.regex() {
            regex::Regex::new(&pattern)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_type_parse() {
        assert_eq!("REGEX".parse::<MatchingType>().unwrap(), MatchingType::Regex);
        assert_eq!("timestamp".parse::<MatchingType>().unwrap(), MatchingType::Timestamp);

        let err = "COMMAND".parse::<MatchingType>().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedMatcher { ref kind } if kind == "COMMAND"));
    }

    #[test]
    fn test_matcher_serde() {
        let json = r#"{"path": "$.items", "type": "TYPE", "minOccurrence": 1, "maxOccurrence": 3}"#;
        let matcher: Matcher = serde_json::from_str(json).unwrap();
        assert_eq!(matcher, Matcher::by_type_with_occurrence("$.items", Some(1), Some(3)));

        let json = r#"{"path": "$.id", "type": "REGEX", "value": "[0-9]+"}"#;
        let matcher: Matcher = serde_json::from_str(json).unwrap();
        assert_eq!(matcher.regex().as_deref(), Some("[0-9]+"));

        let round_trip = serde_json::to_value(&matcher).unwrap();
        assert_eq!(round_trip["type"], "REGEX");
    }

    #[test]
    fn test_unknown_matching_type_is_rejected() {
        let json = r#"{"path": "$.id", "type": "COMMAND"}"#;
        let err = serde_json::from_str::<Matcher>(json).unwrap_err();
        assert!(err.to_string().contains("Unsupported matching type: COMMAND"));
    }

    #[test]
    fn test_date_time_matchers_carry_patterns() {
        assert_eq!(Matcher::by_date("$.d").regex().as_deref(), Some(ISO_DATE));
        assert_eq!(Matcher::by_time("$.t").regex().as_deref(), Some(ISO_TIME));
        assert_eq!(Matcher::by_timestamp("$.ts").regex().as_deref(), Some(ISO_DATE_TIME));
        assert_eq!(Matcher::by_null("$.n").regex(), None);
    }

    #[test]
    fn test_validate() {
        assert!(Matcher::by_regex("$.id", "[0-9]+").validate().is_ok());
        assert!(Matcher::by_date("$.d").validate().is_ok());

        let mut bounded = Matcher::by_regex("$.id", "a");
        bounded.min_occurrence = Some(1);
        assert!(matches!(
            bounded.validate(),
            Err(EngineError::OccurrenceOnNonType { .. })
        ));

        let mut missing = Matcher::by_regex("$.id", "a");
        missing.value = None;
        assert!(matches!(missing.validate(), Err(EngineError::MissingRegex { .. })));

        assert!(matches!(
            Matcher::by_regex("$.id", "(unclosed").validate(),
            Err(EngineError::Regex(_))
        ));
        assert!(matches!(
            Matcher::by_type("id").validate(),
            Err(EngineError::InvalidPath { .. })
        ));
    }
}
