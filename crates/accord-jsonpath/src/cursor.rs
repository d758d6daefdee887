//! Path/assertion builder.
//!
//! A [`Cursor`] is an immutable position in the body being described. Each
//! derivation method returns a new cursor one step deeper; each terminal
//! method returns a finished cursor carrying a [`PathAssertion`]. A finished
//! cursor ignores further derivation, so a traversal can derive speculatively
//! without disturbing an assertion that was already produced.

use std::fmt;

use serde::Serialize;

use crate::model::Scalar;
use crate::path::{JsonPath, Segment};

/// How the cursor reached its current position with respect to arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayMode {
    /// No array step on the path.
    #[default]
    None,
    /// Every array step on the path is a concrete index.
    Indexed,
    /// At least one array step on the path matches every element.
    Wildcard,
}

/// The check attached to a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Assertion {
    /// The value equals a literal, with its JSON type preserved.
    EqualsLiteral(Scalar),
    /// The value, as text, fully matches a regex.
    MatchesRegex(String),
    /// The array has exactly `n` elements.
    HasSize(usize),
    /// The map, list or string is empty.
    IsEmpty,
    /// Some element of the array equals the literal.
    ContainsInArray(Scalar),
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::EqualsLiteral(Scalar::String(s)) => write!(f, "== {s:?}"),
            Assertion::EqualsLiteral(value) => write!(f, "== {value}"),
            Assertion::MatchesRegex(pattern) => write!(f, "=~ /{pattern}/"),
            Assertion::HasSize(n) => write!(f, "has size {n}"),
            Assertion::IsEmpty => f.write_str("is empty"),
            Assertion::ContainsInArray(Scalar::String(s)) => write!(f, "contains {s:?}"),
            Assertion::ContainsInArray(value) => write!(f, "contains {value}"),
        }
    }
}

/// One emitted check: where to look and what to expect there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathAssertion {
    path: JsonPath,
    assertion: Assertion,
}

impl PathAssertion {
    pub fn new(path: JsonPath, assertion: Assertion) -> Self {
        Self { path, assertion }
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }
}

impl fmt::Display for PathAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.assertion)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cursor {
    path: JsonPath,
    mode: ArrayMode,
    finished: Option<PathAssertion>,
}

impl Cursor {
    /// A cursor at `$`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    pub fn mode(&self) -> ArrayMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// The assertion recorded by a terminal call.
    pub fn assertion(&self) -> Option<&PathAssertion> {
        self.finished.as_ref()
    }

    pub fn into_assertion(self) -> Option<PathAssertion> {
        self.finished
    }

    fn derive(&self, segment: Segment, mode: ArrayMode) -> Self {
        if self.is_finished() {
            return self.clone();
        }
        Self {
            path: self.path.child(segment),
            mode,
            finished: None,
        }
    }

    fn finish(&self, path: JsonPath, assertion: Assertion) -> Self {
        if self.is_finished() {
            return self.clone();
        }
        Self {
            finished: Some(PathAssertion::new(path.clone(), assertion)),
            path,
            mode: self.mode,
        }
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        self.derive(Segment::Field(name.into()), self.mode)
    }

    /// Address a field holding a list whose elements are visited one by one.
    pub fn array(&self, name: impl Into<String>) -> Self {
        self.field(name)
    }

    /// Address every element of a field holding a list of primitives.
    pub fn array_field(&self, name: impl Into<String>) -> Self {
        self.field(name).elements()
    }

    /// Every element of the array at the current path.
    pub fn elements(&self) -> Self {
        self.derive(Segment::Wildcard, ArrayMode::Wildcard)
    }

    pub fn element_with_index(&self, index: usize) -> Self {
        let mode = match self.mode {
            ArrayMode::Wildcard => ArrayMode::Wildcard,
            _ => ArrayMode::Indexed,
        };
        self.derive(Segment::Index(index), mode)
    }

    pub fn is_equal_to(&self, value: impl Into<Scalar>) -> Self {
        self.finish(self.path.clone(), Assertion::EqualsLiteral(value.into()))
    }

    pub fn matches(&self, pattern: impl Into<String>) -> Self {
        self.finish(self.path.clone(), Assertion::MatchesRegex(pattern.into()))
    }

    pub fn has_size(&self, size: usize) -> Self {
        self.finish(self.path.clone(), Assertion::HasSize(size))
    }

    pub fn is_empty(&self) -> Self {
        self.finish(self.path.clone(), Assertion::IsEmpty)
    }

    /// Membership in the array at the current path. A cursor that does not yet
    /// address the elements is widened to `[*]` first.
    pub fn contains(&self, value: impl Into<Scalar>) -> Self {
        let path = if self.is_asserting_a_value_in_array() {
            self.path.clone()
        } else {
            self.path.wildcard()
        };
        self.finish(path, Assertion::ContainsInArray(value.into()))
    }

    /// True when some array step on the path matches every element.
    pub fn is_iterating_over_array(&self) -> bool {
        self.mode == ArrayMode::Wildcard
    }

    /// True when the cursor addresses the elements of an array that is not
    /// a named field, e.g. `$[*]` or `$.a[*][*]`.
    pub fn is_iterating_over_nameless_array(&self) -> bool {
        let segments = self.path.segments();
        match segments {
            [.., before, Segment::Wildcard] => !matches!(before, Segment::Field(_)),
            [Segment::Wildcard] => true,
            _ => false,
        }
    }

    /// True when a leaf at this position is one element among many, so it
    /// is checked by membership rather than by equality.
    pub fn is_asserting_a_value_in_array(&self) -> bool {
        self.path.last() == Some(&Segment::Wildcard)
    }
}
