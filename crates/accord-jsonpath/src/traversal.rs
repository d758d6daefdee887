//! Traversal engine: walks a resolved body and emits one [`PathAssertion`]
//! per leaf, empty container or ordered primitive array.

use crate::converter::BodyParser;
use crate::cursor::{Cursor, PathAssertion};
use crate::error::{EngineError, Result};
use crate::model::{Scalar, ValueNode};

/// Recursive walker over a [`ValueNode`] tree.
///
/// Emission order is map insertion order, then list index order.
pub struct Traversal<'p> {
    ordered: bool,
    max_depth: usize,
    parser: &'p dyn BodyParser,
}

impl<'p> Traversal<'p> {
    pub fn new(ordered: bool, max_depth: usize, parser: &'p dyn BodyParser) -> Self {
        Self {
            ordered,
            max_depth,
            parser,
        }
    }

    /// Walk `root` starting at `cursor`, passing every produced assertion to
    /// `emit`.
    pub fn traverse<F>(&self, root: &ValueNode, cursor: Cursor, emit: &mut F) -> Result<()>
    where
        F: FnMut(PathAssertion),
    {
        self.visit(root, cursor, 0, emit)
    }

    fn visit<F>(&self, node: &ValueNode, cursor: Cursor, depth: usize, emit: &mut F) -> Result<()>
    where
        F: FnMut(PathAssertion),
    {
        if depth > self.max_depth {
            return Err(EngineError::DepthLimitExceeded {
                path: cursor.path().to_string(),
                limit: self.max_depth,
            });
        }
        match node {
            ValueNode::Object(map) => {
                if map.is_empty() {
                    return finish(cursor.is_empty(), emit);
                }
                for (key, value) in map.iter() {
                    match value {
                        ValueNode::Array(items) if items.is_empty() => {
                            finish(cursor.array(key).is_empty(), emit)?;
                        }
                        ValueNode::Array(items)
                            if !self.ordered && items.iter().all(ValueNode::is_primitive) =>
                        {
                            self.visit_elements(items, cursor.array_field(key), depth, emit)?;
                        }
                        ValueNode::Array(items) => {
                            self.visit_array(items, cursor.array(key), depth + 1, emit)?;
                        }
                        other => self.visit(other, cursor.field(key), depth + 1, emit)?,
                    }
                }
                Ok(())
            }
            ValueNode::Array(items) => self.visit_array(items, cursor, depth, emit),
            // only embedded objects are expanded; an embedded list stays text
            ValueNode::Scalar(Scalar::String(text)) if !text.is_empty() => {
                match self.parser.parse(text) {
                    Some(parsed @ ValueNode::Object(_)) => self.visit(&parsed, cursor, depth + 1, emit),
                    _ => self.visit_leaf(node, cursor, emit),
                }
            }
            leaf => self.visit_leaf(leaf, cursor, emit),
        }
    }

    /// `cursor` addresses the array node itself.
    fn visit_array<F>(
        &self,
        items: &[ValueNode],
        cursor: Cursor,
        depth: usize,
        emit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(PathAssertion),
    {
        if items.is_empty() {
            return finish(cursor.is_empty(), emit);
        }
        if !self.ordered {
            return self.visit_elements(items, cursor.elements(), depth, emit);
        }
        if items.iter().all(ValueNode::is_primitive) && !cursor.path().has_wildcard() {
            finish(cursor.has_size(items.len()), emit)?;
        }
        for (index, item) in items.iter().enumerate() {
            self.visit(item, cursor.element_with_index(index), depth + 1, emit)?;
        }
        Ok(())
    }

    /// `cursor` addresses every element of the array, one shared cursor for
    /// all of them.
    fn visit_elements<F>(
        &self,
        items: &[ValueNode],
        cursor: Cursor,
        depth: usize,
        emit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(PathAssertion),
    {
        for item in items {
            self.visit(item, cursor.clone(), depth + 1, emit)?;
        }
        Ok(())
    }

    fn visit_leaf<F>(&self, leaf: &ValueNode, cursor: Cursor, emit: &mut F) -> Result<()>
    where
        F: FnMut(PathAssertion),
    {
        let finished = match leaf {
            ValueNode::Pattern(regex) => cursor.matches(regex.as_str()),
            ValueNode::Interpolated(interpolated) => cursor.matches(interpolated.to_regex()),
            ValueNode::Scalar(scalar) if cursor.is_asserting_a_value_in_array() => {
                cursor.contains(scalar.clone())
            }
            ValueNode::Scalar(scalar) => cursor.is_equal_to(scalar.clone()),
            ValueNode::Object(_) | ValueNode::Array(_) => return Ok(()),
        };
        finish(finished, emit)
    }
}

fn finish<F>(cursor: Cursor, emit: &mut F) -> Result<()>
where
    F: FnMut(PathAssertion),
{
    if let Some(assertion) = cursor.into_assertion() {
        emit(assertion);
    }
    Ok(())
}
