//! Concrete example values for regex-valued nodes.
//!
//! A filter expression comparing by equality needs an actual value where the
//! contract only holds a regex. Generation is seeded, so the same pattern
//! always yields the same value and emitted filters stay deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EngineError, Result};
use crate::model::{InterpolatedPart, ObjectMap, Side, ValueNode};

/// Upper bound for unbounded repetitions such as `+` and `*`.
const MAX_REPEAT: u32 = 8;

const SEED: u64 = 0x00ac_c0bd;

fn generation_error(pattern: &str, reason: impl ToString) -> EngineError {
    EngineError::Generation {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

/// A string fully matched by `pattern`.
pub fn example_for(pattern: &str) -> Result<String> {
    let mut rng = StdRng::seed_from_u64(SEED);
    // ASCII classes first, so `\d` yields `0-9`
    if let Ok(ascii) = rand_regex::Regex::compile(&format!("(?-u:{pattern})"), MAX_REPEAT) {
        let bytes: Vec<u8> = rng.sample(&ascii);
        if let Ok(value) = String::from_utf8(bytes) {
            return Ok(value);
        }
    }
    let generator = rand_regex::Regex::compile(pattern, MAX_REPEAT)
        .map_err(|err| generation_error(pattern, err))?;
    let bytes: Vec<u8> = rng.sample(&generator);
    String::from_utf8(bytes).map_err(|err| generation_error(pattern, err))
}

fn example_part(part: &InterpolatedPart) -> Result<String> {
    match part.for_side(Side::Server) {
        InterpolatedPart::Literal(text) => Ok(text.clone()),
        InterpolatedPart::Pattern(pattern) => example_for(pattern),
        InterpolatedPart::Dual { server, .. } => example_part(server),
    }
}

/// Replace a regex-valued leaf with a generated string matching it. Every
/// other node is returned unchanged.
pub fn generated_value_if_needed(node: &ValueNode) -> Result<ValueNode> {
    match node {
        ValueNode::Pattern(pattern) => example_for(pattern).map(ValueNode::string),
        ValueNode::Interpolated(interpolated) => interpolated
            .parts()
            .iter()
            .map(example_part)
            .collect::<Result<String>>()
            .map(ValueNode::string),
        other => Ok(other.clone()),
    }
}

/// Apply [`generated_value_if_needed`] to every leaf of `tree`.
///
/// Recursive; callers bound the depth with [`ValueNode::check_depth`] first.
pub fn with_generated_values(tree: &ValueNode) -> Result<ValueNode> {
    match tree {
        ValueNode::Object(map) => {
            let mut generated = ObjectMap::new();
            for (key, value) in map.iter() {
                generated.insert(key, with_generated_values(value)?);
            }
            Ok(ValueNode::Object(generated))
        }
        ValueNode::Array(items) => items
            .iter()
            .map(with_generated_values)
            .collect::<Result<Vec<_>>>()
            .map(ValueNode::Array),
        leaf => generated_value_if_needed(leaf),
    }
}
