//! Structured JSON paths.
//!
//! Paths are held as a sequence of segments and only turned into text at the
//! boundary, so the engines never split or trim path strings.
//!
//! Accepted syntax (a subset of the Jayway/RFC 9535 dialects):
//!
//! - `$` - the root
//! - `.name` and `['name']` - a field
//! - `[3]` - an array index
//! - `[*]` and `.*` - every element
//! - `..name` and `..['name']` - every `name` field at any depth

mod select;

use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;
use crate::model::ValueNode;

pub use select::{delete, locate, read, select, Location, Read, Step};

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Field(String),
    Index(usize),
    Wildcard,
    Descendant(String),
}

impl Segment {
    /// Index and wildcard steps, written in brackets.
    pub fn is_array_step(&self) -> bool {
        matches!(self, Segment::Index(_) | Segment::Wildcard)
    }
}

/// A parsed JSON path rooted at `$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        self.child(Segment::Field(name.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }

    pub fn wildcard(&self) -> Self {
        self.child(Segment::Wildcard)
    }

    /// The first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Path without its last segment. The root has no parent.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(self.prefix(self.segments.len() - 1))
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    pub fn has_descendant(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Descendant(_)))
    }

    /// A definite path addresses at most one node.
    pub fn is_definite(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Field(_) | Segment::Index(_)))
    }

    /// True when `self` equals `ancestor` or lies below it.
    pub fn starts_with(&self, ancestor: &JsonPath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// Render in RFC 9535 normalized form, e.g. `$['a'][0][*]`.
    pub fn to_rfc9535(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.segments {
            match segment {
                Segment::Field(name) => {
                    out.push_str("['");
                    out.push_str(&escape_quoted(name));
                    out.push_str("']");
                }
                Segment::Index(i) => out.push_str(&format!("[{i}]")),
                Segment::Wildcard => out.push_str("[*]"),
                Segment::Descendant(name) => {
                    out.push_str("..['");
                    out.push_str(&escape_quoted(name));
                    out.push_str("']");
                }
            }
        }
        out
    }
}

/// Names that can be written with dot notation.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$')
}

fn escape_quoted(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) if is_plain_name(name) => write!(f, ".{name}"),
            Segment::Field(name) => write!(f, "['{}']", escape_quoted(name)),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Wildcard => f.write_str("[*]"),
            Segment::Descendant(name) if is_plain_name(name) => write!(f, "..{name}"),
            Segment::Descendant(name) => write!(f, "..['{}']", escape_quoted(name)),
        }
    }
}

/// Read the node, or nodes for an indefinite path, at `path` in `tree`.
pub fn read_element<'a>(tree: &'a ValueNode, path: &str) -> Result<Option<Read<'a>>, EngineError> {
    let path: JsonPath = path.parse()?;
    Ok(read(tree, &path))
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for JsonPath {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s).parse()
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> EngineError {
        EngineError::invalid_path(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Result<JsonPath, EngineError> {
        if !self.eat('$') {
            return Err(self.error("path must start with '$'"));
        }
        let mut segments = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    if self.eat('.') {
                        let name = if self.peek() == Some('[') {
                            self.pos += 1;
                            let name = self.quoted_name()?;
                            self.expect(']')?;
                            name
                        } else {
                            self.dotted_name()?
                        };
                        segments.push(Segment::Descendant(name));
                    } else if self.eat('*') {
                        segments.push(Segment::Wildcard);
                    } else if self.peek() == Some('[') {
                        // `$.a.[0]` is accepted as `$.a[0]`
                        continue;
                    } else {
                        segments.push(Segment::Field(self.dotted_name()?));
                    }
                }
                '[' => {
                    self.pos += 1;
                    segments.push(self.bracket()?);
                    self.expect(']')?;
                }
                other => return Err(self.error(format!("unexpected character '{other}'"))),
            }
        }
        Ok(JsonPath { segments })
    }

    fn expect(&mut self, expected: char) -> Result<(), EngineError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}' at position {}", self.pos)))
        }
    }

    fn dotted_name(&mut self) -> Result<String, EngineError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("empty field name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn bracket(&mut self) -> Result<Segment, EngineError> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(Segment::Wildcard)
            }
            Some('\'') | Some('"') => Ok(Segment::Field(self.quoted_name()?)),
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                digits
                    .parse()
                    .map(Segment::Index)
                    .map_err(|_| self.error(format!("index {digits} is out of range")))
            }
            _ => Err(self.error("unsupported bracket selector")),
        }
    }

    fn quoted_name(&mut self) -> Result<String, EngineError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted name")),
        };
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated quoted name")),
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => name.push(c),
                        None => return Err(self.error("unterminated escape")),
                    }
                }
                Some(c) if c == quote => break,
                Some(c) => name.push(c),
            }
            self.pos += 1;
        }
        self.pos += 1;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> JsonPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_dot_and_bracket_notation() {
        let expected = JsonPath::root().field("a").field("b c").index(2).wildcard();
        assert_eq!(parse("$.a['b c'][2][*]"), expected);
        assert_eq!(parse(r#"$["a"]['b c'][2].*"#), expected);
        assert_eq!(parse("$.a.['b c'].[2][*]"), expected);
    }

    #[test]
    fn test_parse_descendant() {
        assert_eq!(
            parse("$..name"),
            JsonPath::from_segments(vec![Segment::Descendant("name".to_string())])
        );
        assert_eq!(
            parse("$.a..['x.y']"),
            JsonPath::root()
                .field("a")
                .child(Segment::Descendant("x.y".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "a.b".parse::<JsonPath>(),
            Err(EngineError::InvalidPath { .. })
        ));
        assert!("$.a[?(@.b == 1)]".parse::<JsonPath>().is_err());
        assert!("$.a['unterminated".parse::<JsonPath>().is_err());
        assert!("$.".parse::<JsonPath>().is_err());
        assert!("$[-1]".parse::<JsonPath>().is_err());
    }

    #[test]
    fn test_display_prefers_dot_notation() {
        assert_eq!(parse("$['a']['b c'][0][*]").to_string(), "$.a['b c'][0][*]");
        assert_eq!(parse(r"$['it\'s']").to_string(), r"$['it\'s']");
        assert_eq!(parse(r#"$["it's"]"#), JsonPath::root().field("it's"));
        assert_eq!(JsonPath::root().to_string(), "$");
        assert_eq!(parse("$..['a b']").to_string(), "$..['a b']");
        assert_eq!(Segment::Field("a b".to_string()).to_string(), "['a b']");
        assert_eq!(Segment::Index(2).to_string(), "[2]");
    }

    #[test]
    fn test_rfc9535_rendering() {
        assert_eq!(parse("$.a[0][*]").to_rfc9535(), "$['a'][0][*]");
        assert_eq!(parse("$..a").to_rfc9535(), "$..['a']");
    }

    #[test]
    fn test_read_element() {
        let tree = ValueNode::from(serde_json::json!({"a": [1, 2]}));
        assert_eq!(
            read_element(&tree, "$.a[1]").unwrap(),
            Some(Read::One(&ValueNode::number(2)))
        );
        assert!(matches!(
            read_element(&tree, "$.a[*]").unwrap(),
            Some(Read::Many(nodes)) if nodes.len() == 2
        ));
        assert!(read_element(&tree, "a").is_err());
    }

    #[test]
    fn test_path_shape_predicates() {
        let path = parse("$.a[*].b");
        assert!(path.has_wildcard());
        assert!(!path.is_definite());
        assert!(parse("$.a[1].b").is_definite());
        assert!(parse("$..b").has_descendant());
        assert!(path.starts_with(&parse("$.a")));
        assert!(!parse("$.ab").starts_with(&parse("$.a[*]")));
        assert_eq!(path.parent(), Some(parse("$.a[*]")));
        assert_eq!(JsonPath::root().parent(), None);
    }
}
