//! Error types for the matching engine.

/// Errors raised while computing assertions, cleaning bodies or building
/// filter expressions.
///
/// Every variant names the path or matcher that caused it so a caller
/// processing many contracts can report the failure against the right one
/// and carry on with the rest.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unsupported matching type: {kind}")]
    UnsupportedMatcher { kind: String },

    #[error("Invalid JSON path [{path}]: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Body hasn't been passed for the equality matcher at [{path}]")]
    MissingBody { path: String },

    #[error("Value [{path}] not found in body {body}")]
    ValueNotFound { path: String, body: String },

    #[error("Regex matcher at [{path}] has no pattern")]
    MissingRegex { path: String },

    #[error("Matcher at [{path}] declares occurrence bounds but is not a type matcher")]
    OccurrenceOnNonType { path: String },

    #[error("Body nesting exceeds the depth limit of {limit} at [{path}]")]
    DepthLimitExceeded { path: String, limit: usize },

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("Cannot generate a value for regex [{pattern}]: {reason}")]
    Generation { pattern: String, reason: String },

    #[error("Invalid verification query [{query}]: {reason}")]
    Query { query: String, reason: String },
}

impl EngineError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = EngineError::MissingBody {
            path: "$.id".to_string(),
        };
        assert!(err.to_string().contains("$.id"));

        let err = EngineError::DepthLimitExceeded {
            path: "$.a.b".to_string(),
            limit: 2,
        };
        assert_eq!(
            err.to_string(),
            "Body nesting exceeds the depth limit of 2 at [$.a.b]"
        );
    }

    #[test]
    fn test_regex_error_is_propagated_unchanged() {
        let regex_err = regex::Regex::new("(unclosed").unwrap_err();
        let expected = regex_err.to_string();
        let err: EngineError = regex_err.into();
        assert_eq!(err.to_string(), expected);
    }
}
