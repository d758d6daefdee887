//! Evaluation of emitted assertions against an actual JSON document.
//!
//! Paths are queried with RFC 9535 semantics. A path that selects several
//! nodes (through `[*]` or `..`) passes when any selected node satisfies the
//! assertion.

use regex::Regex;
use serde_json::Value;

use crate::converter::JsonPaths;
use crate::cursor::{Assertion, PathAssertion};
use crate::error::{EngineError, Result};

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn size(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

impl PathAssertion {
    /// Check this assertion against `actual`.
    pub fn verify(&self, actual: &Value) -> Result<bool> {
        let query = self.path().to_rfc9535();
        let compiled =
            serde_json_path::JsonPath::parse(&query).map_err(|err| EngineError::Query {
                query: query.clone(),
                reason: err.to_string(),
            })?;
        let nodes = compiled.query(actual).all();

        let passed = match self.assertion() {
            Assertion::EqualsLiteral(expected) | Assertion::ContainsInArray(expected) => {
                nodes.iter().any(|node| expected.matches_json(node))
            }
            Assertion::MatchesRegex(pattern) => {
                let regex = Regex::new(&format!("^(?:{pattern})$"))?;
                nodes
                    .iter()
                    .filter_map(|node| as_text(node))
                    .any(|text| regex.is_match(&text))
            }
            Assertion::HasSize(expected) => nodes.iter().any(|node| size(node) == Some(*expected)),
            Assertion::IsEmpty => nodes.iter().any(|node| is_empty(node)),
        };
        Ok(passed)
    }
}

impl JsonPaths {
    /// The assertions `actual` does not satisfy, in emission order.
    pub fn failures(&self, actual: &Value) -> Result<Vec<&PathAssertion>> {
        let mut failed = Vec::new();
        for assertion in self {
            if !assertion.verify(actual)? {
                failed.push(assertion);
            }
        }
        Ok(failed)
    }
}
