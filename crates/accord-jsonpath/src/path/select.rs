//! Reading and deleting nodes of a [`ValueNode`] tree by [`JsonPath`].

use std::fmt;

use super::{JsonPath, Segment};
use crate::error::EngineError;
use crate::model::ValueNode;

/// A concrete step from a container to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// Concrete address of a single node, as produced by [`locate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    steps: Vec<Step>,
}

impl Location {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn push(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    pub fn to_path(&self) -> JsonPath {
        JsonPath::from_segments(
            self.steps
                .iter()
                .map(|step| match step {
                    Step::Key(key) => Segment::Field(key.clone()),
                    Step::Index(i) => Segment::Index(*i),
                })
                .collect(),
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_path(), f)
    }
}

/// Result of reading a path: a single node for definite paths, a list for
/// paths containing wildcards or descendant steps.
#[derive(Debug, Clone, PartialEq)]
pub enum Read<'a> {
    One(&'a ValueNode),
    Many(Vec<&'a ValueNode>),
}

impl<'a> Read<'a> {
    /// The read value as a list, for callers that treat both shapes alike.
    pub fn into_vec(self) -> Vec<&'a ValueNode> {
        match self {
            Read::One(node) => vec![node],
            Read::Many(nodes) => nodes,
        }
    }
}

/// Every location `path` resolves to, in document order.
pub fn locate(root: &ValueNode, path: &JsonPath) -> Vec<Location> {
    let mut current: Vec<(Location, &ValueNode)> = vec![(Location::default(), root)];
    for segment in path.segments() {
        let mut next = Vec::new();
        for (location, node) in current {
            match (segment, node) {
                (Segment::Field(name), ValueNode::Object(map)) => {
                    if let Some(child) = map.get(name) {
                        next.push((location.push(Step::Key(name.clone())), child));
                    }
                }
                (Segment::Index(i), ValueNode::Array(items)) => {
                    if let Some(child) = items.get(*i) {
                        next.push((location.push(Step::Index(*i)), child));
                    }
                }
                (Segment::Wildcard, ValueNode::Array(items)) => {
                    for (i, child) in items.iter().enumerate() {
                        next.push((location.push(Step::Index(i)), child));
                    }
                }
                (Segment::Wildcard, ValueNode::Object(map)) => {
                    for (key, child) in map.iter() {
                        next.push((location.push(Step::Key(key.to_string())), child));
                    }
                }
                (Segment::Descendant(name), _) => collect_descendants(location, node, name, &mut next),
                _ => {}
            }
        }
        current = next;
    }
    current.into_iter().map(|(location, _)| location).collect()
}

/// Pre-order walk collecting every `name` field below `node`.
///
/// Uses an explicit stack so arbitrarily deep bodies cannot overflow it.
fn collect_descendants<'a>(
    location: Location,
    node: &'a ValueNode,
    name: &str,
    out: &mut Vec<(Location, &'a ValueNode)>,
) {
    let mut stack = vec![(location, node)];
    while let Some((location, node)) = stack.pop() {
        let mut children = Vec::new();
        match node {
            ValueNode::Object(map) => {
                for (key, child) in map.iter() {
                    let child_location = location.push(Step::Key(key.to_string()));
                    if key == name {
                        out.push((child_location.clone(), child));
                    }
                    children.push((child_location, child));
                }
            }
            ValueNode::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    children.push((location.push(Step::Index(i)), child));
                }
            }
            _ => {}
        }
        stack.extend(children.into_iter().rev());
    }
}

fn node_at<'a>(root: &'a ValueNode, location: &Location) -> Option<&'a ValueNode> {
    location
        .steps()
        .iter()
        .try_fold(root, |node, step| match (step, node) {
            (Step::Key(key), ValueNode::Object(map)) => map.get(key),
            (Step::Index(i), ValueNode::Array(items)) => items.get(*i),
            _ => None,
        })
}

fn node_at_mut<'a>(root: &'a mut ValueNode, steps: &[Step]) -> Option<&'a mut ValueNode> {
    steps.iter().try_fold(root, |node, step| match (step, node) {
        (Step::Key(key), ValueNode::Object(map)) => map.get_mut(key),
        (Step::Index(i), ValueNode::Array(items)) => items.get_mut(*i),
        _ => None,
    })
}

/// All nodes `path` resolves to, in document order.
pub fn select<'a>(root: &'a ValueNode, path: &JsonPath) -> Vec<&'a ValueNode> {
    locate(root, path)
        .iter()
        .filter_map(|location| node_at(root, location))
        .collect()
}

/// Read `path`. A definite path that addresses nothing yields `None`; an
/// indefinite one always yields a (possibly empty) list.
pub fn read<'a>(root: &'a ValueNode, path: &JsonPath) -> Option<Read<'a>> {
    let nodes = select(root, path);
    if path.is_definite() {
        nodes.into_iter().next().map(Read::One)
    } else {
        Some(Read::Many(nodes))
    }
}

/// Delete every node `path` resolves to and return how many were removed.
///
/// Deleting a missing path is not an error; deleting the root is.
pub fn delete(root: &mut ValueNode, path: &JsonPath) -> Result<usize, EngineError> {
    if path.is_root() {
        return Err(EngineError::invalid_path(
            path.to_string(),
            "the root cannot be deleted",
        ));
    }
    let locations = locate(root, path);
    let mut removed = 0;
    // Reverse document order removes higher indices and nested nodes first,
    // so the remaining locations stay valid.
    for location in locations.iter().rev() {
        let Some((last, parent_steps)) = location.steps().split_last() else {
            continue;
        };
        let removed_here = match (node_at_mut(root, parent_steps), last) {
            (Some(ValueNode::Object(map)), Step::Key(key)) => map.remove(key).is_some(),
            (Some(ValueNode::Array(items)), Step::Index(i)) if *i < items.len() => {
                items.remove(*i);
                true
            }
            _ => false,
        };
        if removed_here {
            removed += 1;
        }
    }
    Ok(removed)
}
