//! JSON path filter expressions, in the Jayway dialect used by stub servers.
//!
//! A path is split into a container and a property relative to it:
//! `$.user.name` becomes container `$.user` and property `@.name`, and the
//! check is written as `$.user[?(@.name ...)]`.
//!
//! Paths ending in `[*]` filter the elements of the list instead:
//! `$.user.tags[*]` becomes `$.user.tags[?(@ ...)]`, not the
//! `$.user[?(@.tags[*] ...)]` a split at the last dot would give. Stub
//! generators reading these expressions get a container that is the list
//! itself and a property that is each element.

use crate::config::DEFAULT_MAX_DEPTH;
use crate::cursor::{Assertion, PathAssertion};
use crate::error::{EngineError, Result};
use crate::generate::with_generated_values;
use crate::model::{Matcher, MatchingType, Scalar, ValueNode};
use crate::path::{self, JsonPath, Read, Segment};

/// Split at the last named step. A trailing `[*]` makes the elements
/// themselves the property.
fn split(path: &JsonPath) -> (JsonPath, String) {
    let segments = path.segments();
    if segments.last() == Some(&Segment::Wildcard) {
        return (path.prefix(segments.len() - 1), "@".to_string());
    }
    let at = segments
        .iter()
        .rposition(|s| matches!(s, Segment::Field(_)))
        .unwrap_or(0);
    let relative: String = segments[at..].iter().map(ToString::to_string).collect();
    (path.prefix(at), format!("@{relative}"))
}

fn filter(container: &JsonPath, comparison: &str) -> String {
    format!("{container}[?({comparison})]")
}

fn regex_comparison(property: &str, pattern: &str) -> String {
    let escaped = if pattern.contains("\\/") {
        pattern.to_string()
    } else {
        pattern.replace('/', "\\/")
    };
    format!("{property} =~ /({escaped})/")
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn scalar_literal(value: &Scalar) -> String {
    match value {
        Scalar::String(text) => quote(text),
        other => other.to_string(),
    }
}

fn node_literal(node: &ValueNode) -> String {
    match node {
        ValueNode::Scalar(Scalar::Number(n)) => n.to_string(),
        ValueNode::Scalar(scalar) => quote(&scalar.to_string()),
        other => match other.to_json() {
            serde_json::Value::String(text) => quote(&text),
            json => quote(&json.to_string()),
        },
    }
}

/// Build the filter expression checking `matcher`.
///
/// The matcher is validated first. EQUALITY reads the expected value from
/// `body`, which is then required; regex placeholders in the body are
/// replaced by generated values matching them. A TYPE matcher without bounds
/// yields an empty predicate (`$[?()]`), leaving only the type check to the
/// caller. Any other matcher without a value yields its bare path.
pub fn to_filter_expression(matcher: &Matcher, body: Option<&ValueNode>) -> Result<String> {
    matcher.validate()?;
    let json_path = matcher.json_path()?;
    let (container, property) = split(&json_path);
    let comparison = match matcher.matching_type {
        MatchingType::Equality => {
            let body = body.ok_or_else(|| EngineError::MissingBody {
                path: matcher.path.clone(),
            })?;
            body.check_depth(DEFAULT_MAX_DEPTH)?;
            let not_found = || EngineError::ValueNotFound {
                path: matcher.path.clone(),
                body: body.to_json().to_string(),
            };
            let literal = match path::read(body, &json_path).ok_or_else(not_found)? {
                Read::One(node) => node_literal(&with_generated_values(node)?),
                Read::Many(nodes) if nodes.is_empty() => return Err(not_found()),
                Read::Many(nodes) => {
                    let values = nodes
                        .into_iter()
                        .map(|node| with_generated_values(node).map(|node| node.to_json()))
                        .collect::<Result<Vec<_>>>()?;
                    quote(&serde_json::Value::Array(values).to_string())
                }
            };
            format!("{property} == {literal}")
        }
        MatchingType::Type => {
            let mut bounds = Vec::new();
            if let Some(min) = matcher.min_occurrence {
                bounds.push(format!("{property}.size() >= {min}"));
            }
            if let Some(max) = matcher.max_occurrence {
                bounds.push(format!("{property}.size() <= {max}"));
            }
            bounds.join(" && ")
        }
        _ => match &matcher.value {
            Some(value) => regex_comparison(&property, &value.to_string()),
            None => return Ok(matcher.path.clone()),
        },
    };
    Ok(filter(&container, &comparison))
}

impl PathAssertion {
    /// The assertion as a filter expression, e.g. `$[?(@.id == 1)]`.
    pub fn to_filter(&self) -> String {
        let (container, property) = split(self.path());
        let comparison = match self.assertion() {
            Assertion::EqualsLiteral(value) | Assertion::ContainsInArray(value) => {
                format!("{property} == {}", scalar_literal(value))
            }
            Assertion::MatchesRegex(pattern) => regex_comparison(&property, pattern),
            Assertion::HasSize(size) => format!("{property}.size() == {size}"),
            Assertion::IsEmpty => format!("{property} empty true"),
        };
        filter(&container, &comparison)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use serde_json::json;

    fn body() -> ValueNode {
        ValueNode::from(json!({
            "id": 1,
            "name": "Joe",
            "user": {"tags": ["a", "b"]},
            "a b": {"c": "x"},
        }))
    }

    #[test]
    fn test_regex_filter() {
        let matcher = Matcher::by_regex("$.secret", "xyz");
        assert_eq!(
            to_filter_expression(&matcher, None).unwrap(),
            "$[?(@.secret =~ /(xyz)/)]"
        );

        let matcher = Matcher::by_regex("$.user.href", "/users/[0-9]+");
        assert_eq!(
            to_filter_expression(&matcher, None).unwrap(),
            r"$.user[?(@.href =~ /(\/users\/[0-9]+)/)]"
        );

        let matcher = Matcher::by_regex("$.href", r"\/already");
        assert_eq!(
            to_filter_expression(&matcher, None).unwrap(),
            r"$[?(@.href =~ /(\/already)/)]"
        );
    }

    #[test]
    fn test_bracket_names_are_atomic() {
        let matcher = Matcher::by_regex("$['a b']['c.d']", "x");
        assert_eq!(
            to_filter_expression(&matcher, None).unwrap(),
            "$['a b'][?(@['c.d'] =~ /(x)/)]"
        );

        let matcher = Matcher::by_regex("$.items[0]", "x");
        assert_eq!(
            to_filter_expression(&matcher, None).unwrap(),
            "$[?(@.items[0] =~ /(x)/)]"
        );
    }

    #[test]
    fn test_date_matchers_use_their_pattern() {
        let expr = to_filter_expression(&Matcher::by_date("$.d"), None).unwrap();
        assert!(expr.starts_with("$[?(@.d =~ /((\\d\\d\\d\\d)"));
    }

    #[test]
    fn test_equality_reads_value_from_body() {
        let body = body();
        assert_eq!(
            to_filter_expression(&Matcher::by_equality("$.id"), Some(&body)).unwrap(),
            "$[?(@.id == 1)]"
        );
        assert_eq!(
            to_filter_expression(&Matcher::by_equality("$.name"), Some(&body)).unwrap(),
            "$[?(@.name == 'Joe')]"
        );
        assert_eq!(
            to_filter_expression(&Matcher::by_equality("$.user.tags[*]"), Some(&body)).unwrap(),
            r#"$.user.tags[?(@ == '["a","b"]')]"#
        );
    }

    #[test]
    fn test_equality_errors() {
        assert!(matches!(
            to_filter_expression(&Matcher::by_equality("$.id"), None),
            Err(EngineError::MissingBody { .. })
        ));
        let err = to_filter_expression(&Matcher::by_equality("$.nope"), Some(&body())).unwrap_err();
        assert!(matches!(err, EngineError::ValueNotFound { .. }));
        assert!(err.to_string().contains("$.nope"));
    }

    #[test]
    fn test_type_bounds() {
        let both = Matcher::by_type_with_occurrence("$.user.tags", Some(1), Some(3));
        assert_eq!(
            to_filter_expression(&both, None).unwrap(),
            "$.user[?(@.tags.size() >= 1 && @.tags.size() <= 3)]"
        );
        let max = Matcher::by_type_with_occurrence("$.tags", None, Some(2));
        assert_eq!(
            to_filter_expression(&max, None).unwrap(),
            "$[?(@.tags.size() <= 2)]"
        );
        assert_eq!(to_filter_expression(&Matcher::by_type("$.tags"), None).unwrap(), "$[?()]");
        assert_eq!(
            to_filter_expression(&Matcher::by_type("$.user.tags"), None).unwrap(),
            "$.user[?()]"
        );
    }

    #[test]
    fn test_equality_over_regex_uses_a_generated_value() {
        let body = ValueNode::object([
            ("id", ValueNode::pattern("[0-9]+")),
            ("codes", ValueNode::array([ValueNode::pattern("[A-Z]{2}")])),
        ]);

        let expr = to_filter_expression(&Matcher::by_equality("$.id"), Some(&body)).unwrap();
        let value = expr
            .strip_prefix("$[?(@.id == '")
            .and_then(|rest| rest.strip_suffix("')]"))
            .unwrap();
        assert!(regex::Regex::new("^[0-9]+$").unwrap().is_match(value), "{expr}");

        let expr = to_filter_expression(&Matcher::by_equality("$.codes[*]"), Some(&body)).unwrap();
        assert!(!expr.contains("[A-Z]"), "{expr}");
        let expected = regex::Regex::new(r#"^\$\.codes\[\?\(@ == '\["[A-Z]{2}"\]'\)\]$"#).unwrap();
        assert!(expected.is_match(&expr), "{expr}");
    }

    #[test]
    fn test_trailing_wildcard_filters_the_elements() {
        let matcher = Matcher::by_regex("$.user.tags[*]", "[a-z]");
        assert_eq!(
            to_filter_expression(&matcher, None).unwrap(),
            "$.user.tags[?(@ =~ /([a-z])/)]"
        );
    }

    #[test]
    fn test_invalid_matchers_are_rejected() {
        let mut bounded = Matcher::by_regex("$.id", "[0-9]+");
        bounded.max_occurrence = Some(2);
        assert!(matches!(
            to_filter_expression(&bounded, None),
            Err(EngineError::OccurrenceOnNonType { .. })
        ));
        assert!(matches!(
            to_filter_expression(&Matcher::by_regex("$.id", "(unclosed"), None),
            Err(EngineError::Regex(_))
        ));
    }

    #[test]
    fn test_valueless_matcher_returns_bare_path() {
        assert_eq!(to_filter_expression(&Matcher::by_null("$.n"), None).unwrap(), "$.n");
    }

    #[test]
    fn test_invalid_path_is_reported() {
        assert!(matches!(
            to_filter_expression(&Matcher::by_regex("secret", "x"), None),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_assertion_filters() {
        let root = Cursor::root();
        let cases = [
            (root.field("id").is_equal_to(1i64), "$[?(@.id == 1)]"),
            (root.field("name").is_equal_to("Joe"), "$[?(@.name == 'Joe')]"),
            (root.field("name").matches("J.*"), "$[?(@.name =~ /(J.*)/)]"),
            (root.array("items").contains(1i64), "$.items[?(@ == 1)]"),
            (root.array("items").has_size(3), "$[?(@.items.size() == 3)]"),
            (root.array("items").is_empty(), "$[?(@.items empty true)]"),
            (root.array("list").elements().field("a").is_equal_to(true), "$.list[*][?(@.a == true)]"),
            (root.is_empty(), "$[?(@ empty true)]"),
        ];
        for (cursor, expected) in cases {
            assert_eq!(cursor.assertion().unwrap().to_filter(), expected);
        }
    }
}
