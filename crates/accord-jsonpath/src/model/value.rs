//! Resolved body tree: the input of the traversal and cleanup engines.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::body::Side;
use crate::error::EngineError;
use crate::path::{JsonPath, Segment};

/// A terminal JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Kept as a JSON number so integers stay integers in emitted assertions.
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Number(_))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }

    /// Compare with a JSON value, treating `1` and `1.0` as equal.
    pub fn matches_json(&self, actual: &Value) -> bool {
        match (self, actual) {
            (Scalar::Null, Value::Null) => true,
            (Scalar::Bool(a), Value::Bool(b)) => a == b,
            (Scalar::String(a), Value::String(b)) => a == b,
            (Scalar::Number(a), Value::Number(b)) => {
                a == b
                    || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<f64> for Scalar {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Scalar::Null, Scalar::Number)
    }
}

/// One piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterpolatedPart {
    /// Text that must appear verbatim.
    Literal(String),
    /// A regex spliced into the string.
    Pattern(String),
    /// A piece with a separate value per side, e.g. a regex for the stub and
    /// a concrete id for the test.
    Dual {
        client: Box<InterpolatedPart>,
        server: Box<InterpolatedPart>,
    },
}

impl InterpolatedPart {
    /// The piece used on `side`. Never a `Dual`.
    pub fn for_side(&self, side: Side) -> &InterpolatedPart {
        let mut part = self;
        while let InterpolatedPart::Dual { client, server } = part {
            part = match side {
                Side::Client => client.as_ref(),
                Side::Server => server.as_ref(),
            };
        }
        part
    }

    // Unresolved dual pieces render their server value, the one a test sees.
    fn to_regex(&self) -> String {
        match self {
            InterpolatedPart::Literal(text) => regex::escape(text),
            InterpolatedPart::Pattern(pattern) => pattern.clone(),
            InterpolatedPart::Dual { server, .. } => server.to_regex(),
        }
    }

    fn as_literal(&self) -> Option<&str> {
        match self {
            InterpolatedPart::Literal(text) => Some(text.as_str()),
            InterpolatedPart::Pattern(_) => None,
            InterpolatedPart::Dual { server, .. } => server.as_literal(),
        }
    }

    fn text(&self) -> &str {
        match self {
            InterpolatedPart::Literal(text) | InterpolatedPart::Pattern(text) => text.as_str(),
            InterpolatedPart::Dual { server, .. } => server.text(),
        }
    }
}

/// A string assembled from literal text and embedded regexes, such as
/// `"/users/${regex('[0-9]+')}"` in a contract description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Interpolated {
    parts: Vec<InterpolatedPart>,
}

impl Interpolated {
    pub fn new(parts: Vec<InterpolatedPart>) -> Self {
        Self { parts }
    }

    pub fn literal(mut self, text: impl Into<String>) -> Self {
        self.parts.push(InterpolatedPart::Literal(text.into()));
        self
    }

    pub fn pattern(mut self, regex: impl Into<String>) -> Self {
        self.parts.push(InterpolatedPart::Pattern(regex.into()));
        self
    }

    pub fn dual(mut self, client: InterpolatedPart, server: InterpolatedPart) -> Self {
        self.parts.push(InterpolatedPart::Dual {
            client: Box::new(client),
            server: Box::new(server),
        });
        self
    }

    pub fn parts(&self) -> &[InterpolatedPart] {
        &self.parts
    }

    /// Replace every dual piece with its value for `side`.
    pub fn for_side(&self, side: Side) -> Interpolated {
        Interpolated {
            parts: self.parts.iter().map(|part| part.for_side(side).clone()).collect(),
        }
    }

    /// The regex a test applies to the actual value: literal text is escaped,
    /// embedded patterns are spliced in as-is.
    pub fn to_regex(&self) -> String {
        self.parts.iter().map(InterpolatedPart::to_regex).collect()
    }

    /// The concatenated text when there is no embedded pattern.
    pub fn as_literal(&self) -> Option<String> {
        self.parts.iter().map(InterpolatedPart::as_literal).collect()
    }

    /// Source text with patterns left in place, for rendering a default body.
    pub fn to_text(&self) -> String {
        self.parts.iter().map(InterpolatedPart::text).collect()
    }
}

/// Insertion-ordered map of field name to node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectMap {
    entries: Vec<(String, ValueNode)>,
}

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. An existing field keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: ValueNode) -> Option<ValueNode> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ValueNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ValueNode> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<ValueNode> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut ValueNode> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn values(&self) -> impl Iterator<Item = &ValueNode> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ObjectMap {
    type Item = (String, ValueNode);
    type IntoIter = std::vec::IntoIter<(String, ValueNode)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, ValueNode)> for ObjectMap {
    fn from_iter<I: IntoIterator<Item = (K, ValueNode)>>(iter: I) -> Self {
        let mut map = ObjectMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A node of a resolved contract body.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Scalar(Scalar),
    /// A value verified by regex rather than by equality.
    Pattern(String),
    Interpolated(Interpolated),
    Object(ObjectMap),
    Array(Vec<ValueNode>),
}

impl ValueNode {
    pub fn null() -> Self {
        ValueNode::Scalar(Scalar::Null)
    }

    pub fn string(value: impl Into<String>) -> Self {
        ValueNode::Scalar(Scalar::String(value.into()))
    }

    pub fn number(value: impl Into<Number>) -> Self {
        ValueNode::Scalar(Scalar::Number(value.into()))
    }

    pub fn float(value: f64) -> Self {
        ValueNode::Scalar(Scalar::from(value))
    }

    pub fn boolean(value: bool) -> Self {
        ValueNode::Scalar(Scalar::Bool(value))
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        ValueNode::Pattern(regex.into())
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, ValueNode)>) -> Self {
        ValueNode::Object(entries.into_iter().collect())
    }

    pub fn array(items: impl IntoIterator<Item = ValueNode>) -> Self {
        ValueNode::Array(items.into_iter().collect())
    }

    /// Leaves that can sit in a "list of primitives". Null does not count.
    pub fn is_primitive(&self) -> bool {
        match self {
            ValueNode::Scalar(scalar) => !scalar.is_null(),
            ValueNode::Pattern(_) | ValueNode::Interpolated(_) => true,
            ValueNode::Object(_) | ValueNode::Array(_) => false,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ValueNode::Object(_) | ValueNode::Array(_))
    }

    /// An empty map, an empty list or an empty string.
    pub fn is_empty_value(&self) -> bool {
        match self {
            ValueNode::Object(map) => map.is_empty(),
            ValueNode::Array(items) => items.is_empty(),
            ValueNode::Scalar(Scalar::String(s)) => s.is_empty(),
            _ => false,
        }
    }

    /// True for an empty container, or a container holding only empty containers.
    pub fn contains_only_empty_elements(&self) -> bool {
        let empty_container = |node: &ValueNode| match node {
            ValueNode::Object(map) => map.is_empty(),
            ValueNode::Array(items) => items.is_empty(),
            _ => false,
        };
        match self {
            ValueNode::Object(map) => map.values().all(empty_container),
            ValueNode::Array(items) => items.iter().all(empty_container),
            _ => false,
        }
    }

    /// Fail with [`EngineError::DepthLimitExceeded`] when containers nest
    /// deeper than `limit`. Iterative, so it is safe on any tree.
    pub fn check_depth(&self, limit: usize) -> Result<(), EngineError> {
        let mut trail: Vec<Segment> = Vec::new();
        let mut pending: Vec<(&ValueNode, usize, Option<Segment>)> = vec![(self, 0, None)];
        while let Some((node, depth, segment)) = pending.pop() {
            if let Some(segment) = segment {
                trail.truncate(depth - 1);
                trail.push(segment);
            }
            if depth > limit {
                return Err(EngineError::DepthLimitExceeded {
                    path: JsonPath::from_segments(trail).to_string(),
                    limit,
                });
            }
            match node {
                ValueNode::Object(map) => pending.extend(
                    map.iter()
                        .map(|(key, child)| (child, depth + 1, Some(Segment::Field(key.to_string())))),
                ),
                ValueNode::Array(items) => pending.extend(
                    items
                        .iter()
                        .enumerate()
                        .map(|(index, child)| (child, depth + 1, Some(Segment::Index(index)))),
                ),
                _ => {}
            }
        }
        Ok(())
    }

    /// Render as plain JSON. Patterns render as their regex source.
    pub fn to_json(&self) -> Value {
        match self {
            ValueNode::Scalar(scalar) => scalar.to_json(),
            ValueNode::Pattern(regex) => Value::String(regex.clone()),
            ValueNode::Interpolated(interpolated) => Value::String(interpolated.to_text()),
            ValueNode::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            ValueNode::Array(items) => Value::Array(items.iter().map(ValueNode::to_json).collect()),
        }
    }
}

impl From<Value> for ValueNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ValueNode::null(),
            Value::Bool(b) => ValueNode::boolean(b),
            Value::Number(n) => ValueNode::Scalar(Scalar::Number(n)),
            Value::String(s) => ValueNode::string(s),
            Value::Array(items) => ValueNode::Array(items.into_iter().map(ValueNode::from).collect()),
            Value::Object(map) => {
                ValueNode::Object(map.into_iter().map(|(k, v)| (k, ValueNode::from(v))).collect())
            }
        }
    }
}

impl From<Scalar> for ValueNode {
    fn from(value: Scalar) -> Self {
        ValueNode::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_map_keeps_insertion_order() {
        let mut map = ObjectMap::new();
        map.insert("b", ValueNode::number(1));
        map.insert("a", ValueNode::number(2));
        map.insert("b", ValueNode::number(3));

        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&ValueNode::number(3)));
        assert_eq!(map.remove("b"), Some(ValueNode::number(3)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_from_json_preserves_document_order() {
        let node = ValueNode::from(json!({"z": 1, "a": [true, null], "m": {"k": "v"}}));
        let ValueNode::Object(map) = &node else {
            panic!("expected object");
        };
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(node.to_json(), json!({"z": 1, "a": [true, null], "m": {"k": "v"}}));
    }

    #[test]
    fn test_primitive_classification() {
        assert!(ValueNode::string("x").is_primitive());
        assert!(ValueNode::pattern("[0-9]+").is_primitive());
        assert!(!ValueNode::null().is_primitive());
        assert!(!ValueNode::array([]).is_primitive());
    }

    #[test]
    fn test_contains_only_empty_elements() {
        assert!(ValueNode::object::<&str>([]).contains_only_empty_elements());
        assert!(ValueNode::array([ValueNode::array([]), ValueNode::object::<&str>([])])
            .contains_only_empty_elements());
        assert!(!ValueNode::array([ValueNode::number(1)]).contains_only_empty_elements());
        assert!(!ValueNode::object([("a", ValueNode::array([ValueNode::null()]))])
            .contains_only_empty_elements());
        assert!(!ValueNode::string("").contains_only_empty_elements());
    }

    #[test]
    fn test_interpolated_regex_escapes_literals() {
        let value = Interpolated::default().literal("/users/").pattern("[0-9]+").literal(".json");
        assert_eq!(value.to_regex(), r"/users/[0-9]+\.json");
        assert_eq!(value.as_literal(), None);
        assert_eq!(value.to_text(), "/users/[0-9]+.json");

        let plain = Interpolated::default().literal("a").literal("b");
        assert_eq!(plain.as_literal(), Some("ab".to_string()));
    }

    #[test]
    fn test_interpolated_dual_parts_pick_a_side() {
        let href = Interpolated::default().literal("/users/").dual(
            InterpolatedPart::Pattern("[0-9]+".to_string()),
            InterpolatedPart::Literal("7".to_string()),
        );
        assert_eq!(href.for_side(Side::Server).as_literal(), Some("/users/7".to_string()));
        assert_eq!(href.for_side(Side::Client).as_literal(), None);
        assert_eq!(href.for_side(Side::Client).to_regex(), "/users/[0-9]+");
        assert!(href
            .for_side(Side::Client)
            .parts()
            .iter()
            .all(|part| !matches!(part, InterpolatedPart::Dual { .. })));
    }

    #[test]
    fn test_check_depth_reports_the_offending_path() {
        let node = ValueNode::from(json!({"a": [{"b": {"c": 1}}], "d": 2}));
        assert!(node.check_depth(4).is_ok());

        let err = node.check_depth(2).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DepthLimitExceeded { ref path, limit: 2 } if path == "$.a[0].b"
        ));
    }

    #[test]
    fn test_check_depth_survives_very_deep_trees() {
        let mut node = ValueNode::number(1);
        for _ in 0..100_000 {
            node = ValueNode::Array(vec![node]);
        }
        let result = node.check_depth(256);
        assert!(matches!(result, Err(EngineError::DepthLimitExceeded { limit: 256, .. })));
        // unwrap one level at a time so the drop itself stays shallow
        while let ValueNode::Array(mut items) = node {
            node = items.pop().unwrap_or_else(ValueNode::null);
        }
    }

    #[test]
    fn test_scalar_numeric_equality_ignores_representation() {
        let one = Scalar::from(1i64);
        assert!(one.matches_json(&json!(1)));
        assert!(one.matches_json(&json!(1.0)));
        assert!(!one.matches_json(&json!("1")));
        assert_eq!(Scalar::from(f64::NAN), Scalar::Null);
    }
}
