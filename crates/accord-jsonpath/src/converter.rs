//! Orchestrator: turns a contract body into the ordered set of path
//! assertions for one side of the contract.

use std::collections::HashSet;

use tracing::debug;

use crate::cleanup::remove_matched_paths_with_limit;
use crate::config::ConverterConfig;
use crate::cursor::{Cursor, PathAssertion};
use crate::error::Result;
use crate::generate;
use crate::model::{ContractBody, Matcher, Side, ValueNode};
use crate::traversal::Traversal;

/// Parses a string value that may hold an embedded document.
///
/// Returning `None` keeps the string as a plain leaf.
pub trait BodyParser {
    fn parse(&self, text: &str) -> Option<ValueNode>;
}

/// Parses embedded JSON with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyParser;

impl BodyParser for JsonBodyParser {
    fn parse(&self, text: &str) -> Option<ValueNode> {
        let trimmed = text.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return None;
        }
        serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .map(ValueNode::from)
    }
}

/// Never parses; every string stays a leaf.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTextParser;

impl BodyParser for RawTextParser {
    fn parse(&self, _text: &str) -> Option<ValueNode> {
        None
    }
}

impl<F> BodyParser for F
where
    F: Fn(&str) -> Option<ValueNode>,
{
    fn parse(&self, text: &str) -> Option<ValueNode> {
        self(text)
    }
}

/// Insertion-ordered, duplicate-free collection of path assertions.
#[derive(Debug, Clone, Default)]
pub struct JsonPaths {
    entries: Vec<PathAssertion>,
    seen: HashSet<PathAssertion>,
}

impl JsonPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assertion. Returns false when an equal one is already present.
    pub fn insert(&mut self, assertion: PathAssertion) -> bool {
        if self.seen.contains(&assertion) {
            return false;
        }
        self.seen.insert(assertion.clone());
        self.entries.push(assertion);
        true
    }

    pub fn contains(&self, assertion: &PathAssertion) -> bool {
        self.seen.contains(assertion)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathAssertion> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[PathAssertion] {
        &self.entries
    }
}

impl PartialEq for JsonPaths {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for JsonPaths {}

impl IntoIterator for JsonPaths {
    type Item = PathAssertion;
    type IntoIter = std::vec::IntoIter<PathAssertion>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a JsonPaths {
    type Item = &'a PathAssertion;
    type IntoIter = std::slice::Iter<'a, PathAssertion>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<PathAssertion> for JsonPaths {
    fn from_iter<I: IntoIterator<Item = PathAssertion>>(iter: I) -> Self {
        let mut paths = JsonPaths::new();
        for assertion in iter {
            paths.insert(assertion);
        }
        paths
    }
}

/// Computes path assertions for contract bodies.
#[derive(Debug, Clone, Default)]
pub struct JsonPathsConverter {
    config: ConverterConfig,
}

impl JsonPathsConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Assertions a generated test runs against the producer's response.
    pub fn server_side_paths(&self, body: &ContractBody) -> Result<JsonPaths> {
        self.compute_paths(body, Side::Server, &JsonBodyParser, false)
    }

    pub fn server_side_paths_with_empty_check(&self, body: &ContractBody) -> Result<JsonPaths> {
        self.compute_paths(body, Side::Server, &JsonBodyParser, true)
    }

    /// Assertions a stub applies to the consumer's request.
    pub fn client_side_paths(&self, body: &ContractBody) -> Result<JsonPaths> {
        self.compute_paths(body, Side::Client, &JsonBodyParser, false)
    }

    pub fn client_side_paths_with_empty_check(&self, body: &ContractBody) -> Result<JsonPaths> {
        self.compute_paths(body, Side::Client, &JsonBodyParser, true)
    }

    /// Client-side assertions with the unordered policy, for callers that
    /// never want array size checks.
    pub fn client_side_paths_without_array_size_check(body: &ContractBody) -> Result<JsonPaths> {
        let config = ConverterConfig {
            ordered_arrays: false,
            ..ConverterConfig::default()
        };
        JsonPathsConverter::new(config).client_side_paths(body)
    }

    /// Remove the values claimed by `matchers` from `tree`, within the
    /// configured depth limit.
    pub fn remove_matched_paths(&self, tree: &ValueNode, matchers: &[Matcher]) -> Result<ValueNode> {
        remove_matched_paths_with_limit(tree, matchers, self.config.max_depth)
    }

    /// A generated string for a regex-valued node, the node itself otherwise.
    pub fn generated_value_if_needed(value: &ValueNode) -> Result<ValueNode> {
        generate::generated_value_if_needed(value)
    }

    /// Resolve `body` for `side` and describe it as path assertions.
    ///
    /// An empty body yields no assertions, or a single `$ is empty` when
    /// `include_empty_check` is set. A null body always yields none. Bodies
    /// nested deeper than the configured limit fail with
    /// [`EngineError::DepthLimitExceeded`](crate::EngineError::DepthLimitExceeded).
    pub fn compute_paths(
        &self,
        body: &ContractBody,
        side: Side,
        parser: &dyn BodyParser,
        include_empty_check: bool,
    ) -> Result<JsonPaths> {
        let resolved = body.resolve_with_limit(side, self.config.max_depth)?;
        let mut paths = JsonPaths::new();
        if matches!(resolved, ValueNode::Scalar(ref scalar) if scalar.is_null()) {
            debug!(?side, "Body is null, no assertions produced");
            return Ok(paths);
        }
        if resolved.is_empty_value() {
            if include_empty_check {
                debug!(?side, "Body is empty, asserting an empty root");
                if let Some(assertion) = Cursor::root().is_empty().into_assertion() {
                    paths.insert(assertion);
                }
            } else {
                debug!(?side, "Body is empty, no assertions produced");
            }
            return Ok(paths);
        }

        debug!(
            ?side,
            ordered = self.config.ordered_arrays,
            "Computing JSON paths"
        );
        Traversal::new(self.config.ordered_arrays, self.config.max_depth, parser).traverse(
            &resolved,
            Cursor::root(),
            &mut |assertion| {
                paths.insert(assertion);
            },
        )?;
        debug!(?side, count = paths.len(), "Computed JSON paths");
        Ok(paths)
    }
}
