//! Matcher removal.
//!
//! Explicit matchers claim parts of the body. Before the traversal engine
//! describes what is left, the claimed values are deleted from a copy of the
//! tree and any container emptied by those deletions is removed as well, so no
//! `is empty` assertion is produced for a container that only looked empty
//! because its content was claimed.

use tracing::{debug, trace};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::Result;
use crate::model::{Matcher, ValueNode};
use crate::path::{self, JsonPath, Read, Segment};

/// Return a copy of `tree` without the values claimed by `matchers`.
///
/// Matchers whose path is malformed or does not resolve are skipped. Trees
/// nested deeper than the default depth limit are rejected before copying.
pub fn remove_matched_paths(tree: &ValueNode, matchers: &[Matcher]) -> Result<ValueNode> {
    remove_matched_paths_with_limit(tree, matchers, DEFAULT_MAX_DEPTH)
}

/// [`remove_matched_paths`] with an explicit depth limit.
pub fn remove_matched_paths_with_limit(
    tree: &ValueNode,
    matchers: &[Matcher],
    max_depth: usize,
) -> Result<ValueNode> {
    tree.check_depth(max_depth)?;
    let mut copy = tree.clone();
    if matchers.is_empty() {
        return Ok(copy);
    }
    let mut deleted = delete_matched(&mut copy, matchers);
    deleted.sort_by_key(|path| std::cmp::Reverse(path.to_string()));
    for path in &deleted {
        remove_trailing_containers(&mut copy, path);
    }
    Ok(copy)
}

fn delete_matched(tree: &mut ValueNode, matchers: &[Matcher]) -> Vec<JsonPath> {
    let mut deleted = Vec::new();
    for matcher in matchers {
        let json_path = match matcher.json_path() {
            Ok(json_path) => json_path,
            Err(err) => {
                trace!(path = %matcher.path, error = %err, "Skipping matcher with unparseable path");
                continue;
            }
        };
        let found = match path::read(tree, &json_path) {
            Some(Read::One(_)) => true,
            Some(Read::Many(nodes)) => !nodes.is_empty(),
            None => false,
        };
        if !found {
            trace!(path = %json_path, "Matcher path not found in body");
            continue;
        }
        match path::delete(tree, &json_path) {
            Ok(count) => {
                debug!(path = %json_path, removed = count, "Removed matched value");
                deleted.push(json_path);
            }
            Err(err) => trace!(path = %json_path, error = %err, "Exception deleting path"),
        }
    }
    deleted
}

/// Path with everything from its last array step removed, e.g. `$.a[0].b`
/// becomes `$.a`. Paths without array steps are returned unchanged.
fn without_last_array_step(path: &JsonPath) -> JsonPath {
    match path.segments().iter().rposition(Segment::is_array_step) {
        Some(index) => path.prefix(index),
        None => path.clone(),
    }
}

/// Path up to its last named step, e.g. `$.a[0].b` becomes `$.a[0]`.
fn parent_at_last_name(path: &JsonPath) -> Option<JsonPath> {
    path.segments()
        .iter()
        .rposition(|s| matches!(s, Segment::Field(_) | Segment::Descendant(_)))
        .map(|index| path.prefix(index))
}

fn is_root_elements(path: &JsonPath) -> bool {
    path.segments() == [Segment::Wildcard]
}

fn holds_only_empty(read: &Read<'_>) -> bool {
    match read {
        Read::One(node) => node.is_container() && node.contains_only_empty_elements(),
        Read::Many(nodes) => nodes.iter().all(|node| match node {
            ValueNode::Object(map) => map.is_empty(),
            ValueNode::Array(items) => items.is_empty(),
            _ => false,
        }),
    }
}

fn root_holds_only_empty(tree: &ValueNode) -> bool {
    match tree {
        ValueNode::Array(items) => items.iter().all(ValueNode::contains_only_empty_elements),
        _ => false,
    }
}

/// Climb from a deleted path, removing containers left holding nothing but
/// empty containers. Stops at the root.
fn remove_trailing_containers(tree: &mut ValueNode, deleted: &JsonPath) {
    let mut current = deleted.clone();
    loop {
        let container = without_last_array_step(&current);
        let container_is_hollow = path::read(tree, &container)
            .is_some_and(|read| holds_only_empty(&read));

        if container_is_hollow && !is_root_elements(&current) {
            let to_delete = if container.is_root() {
                JsonPath::root().wildcard()
            } else {
                container
            };
            if to_delete.has_descendant() {
                if root_holds_only_empty(tree) {
                    trace!(path = %to_delete, "Collapsing root array of empty elements");
                    delete_quietly(tree, &JsonPath::root().wildcard());
                }
                return;
            }
            trace!(path = %to_delete, "Removing emptied container");
            delete_quietly(tree, &to_delete);
            current = to_delete;
            continue;
        }

        let Some(parent) = parent_at_last_name(&current) else {
            return;
        };
        let parent_is_hollow = !parent.is_root()
            && path::read(tree, &parent).is_some_and(|read| holds_only_empty(&read));
        if !parent_is_hollow {
            return;
        }
        trace!(path = %parent, "Removing emptied parent");
        delete_quietly(tree, &parent);
        current = parent;
    }
}

fn delete_quietly(tree: &mut ValueNode, target: &JsonPath) {
    if let Err(err) = path::delete(tree, target) {
        trace!(path = %target, error = %err, "Exception removing trailing containers");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use serde_json::json;
    use tracing_test::traced_test;

    fn clean(body: serde_json::Value, matchers: &[Matcher]) -> serde_json::Value {
        remove_matched_paths(&ValueNode::from(body), matchers)
            .unwrap()
            .to_json()
    }

    #[test]
    fn test_removes_matched_field() {
        let cleaned = clean(
            json!({"id": 1, "secret": "xyz"}),
            &[Matcher::by_regex("$.secret", "xyz")],
        );
        assert_eq!(cleaned, json!({"id": 1}));
    }

    #[test]
    fn test_caller_tree_is_untouched() {
        let tree = ValueNode::from(json!({"a": 1}));
        let cleaned = remove_matched_paths(&tree, &[Matcher::by_type("$.a")]).unwrap();
        assert_eq!(cleaned.to_json(), json!({}));
        assert_eq!(tree.to_json(), json!({"a": 1}));
    }

    #[test]
    fn test_too_deep_tree_is_rejected_before_copying() {
        let tree = ValueNode::from(json!({"a": {"b": {"c": {"d": 1}}}}));
        let err = remove_matched_paths_with_limit(&tree, &[Matcher::by_type("$.a.b")], 2)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::DepthLimitExceeded { ref path, limit: 2 } if path == "$.a.b.c"
        ));
        assert!(remove_matched_paths_with_limit(&tree, &[], 4).is_ok());
    }

    #[test]
    fn test_emptied_parents_are_collapsed() {
        let cleaned = clean(
            json!({"id": 1, "user": {"address": {"zip": "123"}}}),
            &[Matcher::by_regex("$.user.address.zip", "[0-9]+")],
        );
        assert_eq!(cleaned, json!({"id": 1}));
    }

    #[test]
    fn test_emptied_array_elements_are_collapsed() {
        let cleaned = clean(
            json!({"id": 1, "list": [{"a": 1}, {"a": 2}]}),
            &[Matcher::by_type("$.list[*].a")],
        );
        assert_eq!(cleaned, json!({"id": 1}));
    }

    #[test]
    fn test_partially_emptied_container_is_kept() {
        let cleaned = clean(
            json!({"user": {"name": "Joe", "address": {"zip": "123"}}}),
            &[Matcher::by_type("$.user.address.zip")],
        );
        assert_eq!(cleaned, json!({"user": {"name": "Joe"}}));
    }

    #[test]
    fn test_originally_empty_containers_survive() {
        let cleaned = clean(
            json!({"tags": [], "meta": {"x": 1}, "id": 2}),
            &[Matcher::by_equality("$.id")],
        );
        assert_eq!(cleaned, json!({"tags": [], "meta": {"x": 1}}));
    }

    #[test]
    fn test_descendant_matcher_collapses_root_array() {
        let cleaned = clean(
            json!([{"x": 1}, {"x": 2}]),
            &[Matcher::by_type("$..x")],
        );
        assert_eq!(cleaned, json!([]));
    }

    #[test]
    fn test_removing_twice_changes_nothing() {
        let matchers = [
            Matcher::by_type("$.a.b"),
            Matcher::by_regex("$.c", "x"),
        ];
        let once = clean(json!({"a": {"b": 1}, "c": "x", "d": 2}), &matchers);
        let twice = clean(once.clone(), &matchers);
        assert_eq!(once, twice);
        assert_eq!(once, json!({"d": 2}));
    }

    #[test]
    #[traced_test]
    fn test_unresolvable_paths_are_logged_and_skipped() {
        let cleaned = clean(
            json!({"a": 1}),
            &[
                Matcher::by_type("$.missing"),
                Matcher::by_type("not a path"),
                Matcher::by_type("$.a"),
            ],
        );
        assert_eq!(cleaned, json!({}));
        assert!(logs_contain("Matcher path not found in body"));
        assert!(logs_contain("Skipping matcher with unparseable path"));
    }

    #[test]
    fn test_path_helpers() {
        let path: JsonPath = "$.a[0].b".parse().unwrap();
        assert_eq!(without_last_array_step(&path).to_string(), "$.a");
        assert_eq!(parent_at_last_name(&path).unwrap().to_string(), "$.a[0]");
        assert_eq!(parent_at_last_name(&"$[0]".parse().unwrap()), None);
    }
}
