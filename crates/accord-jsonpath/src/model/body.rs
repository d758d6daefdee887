//! Contract body as supplied by a contract description, before a side is chosen.

use serde::{Deserialize, Serialize};

use super::value::{Interpolated, ObjectMap, Scalar, ValueNode};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{EngineError, Result};
use crate::path::{JsonPath, Segment};

/// Which party of the contract the values are resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Consumer side: values used by stubs and mock servers.
    Client,
    /// Producer side: values used by generated tests.
    Server,
}

/// A body tree whose nodes may carry a separate value per side.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractBody {
    Scalar(Scalar),
    Pattern(String),
    Interpolated(Interpolated),
    Object(Vec<(String, ContractBody)>),
    Array(Vec<ContractBody>),
    /// A node whose client and server values differ, e.g. a regex for the stub
    /// and a concrete value for the test.
    Dual {
        client: Box<ContractBody>,
        server: Box<ContractBody>,
    },
}

impl ContractBody {
    pub fn dual(client: impl Into<ContractBody>, server: impl Into<ContractBody>) -> Self {
        ContractBody::Dual {
            client: Box::new(client.into()),
            server: Box::new(server.into()),
        }
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, ContractBody)>) -> Self {
        ContractBody::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array(items: impl IntoIterator<Item = ContractBody>) -> Self {
        ContractBody::Array(items.into_iter().collect())
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        ContractBody::Pattern(regex.into())
    }

    pub fn client_value(&self) -> &ContractBody {
        self.value_for(Side::Client)
    }

    pub fn server_value(&self) -> &ContractBody {
        self.value_for(Side::Server)
    }

    fn value_for(&self, side: Side) -> &ContractBody {
        let mut body = self;
        while let ContractBody::Dual { client, server } = body {
            body = match side {
                Side::Client => client.as_ref(),
                Side::Server => server.as_ref(),
            };
        }
        body
    }

    /// Resolve every dual node and dual interpolation piece to the value of
    /// `side`, within the default depth limit.
    ///
    /// Interpolations without an embedded pattern collapse into plain strings.
    pub fn resolve(&self, side: Side) -> Result<ValueNode> {
        self.resolve_with_limit(side, DEFAULT_MAX_DEPTH)
    }

    /// Like [`resolve`](Self::resolve), failing with
    /// [`EngineError::DepthLimitExceeded`] once containers nest deeper than
    /// `max_depth`.
    pub fn resolve_with_limit(&self, side: Side, max_depth: usize) -> Result<ValueNode> {
        let mut trail = Vec::new();
        self.value_for(side).resolve_at(side, 0, max_depth, &mut trail)
    }

    fn resolve_at(
        &self,
        side: Side,
        depth: usize,
        max_depth: usize,
        trail: &mut Vec<Segment>,
    ) -> Result<ValueNode> {
        if depth > max_depth {
            return Err(EngineError::DepthLimitExceeded {
                path: JsonPath::from_segments(trail.clone()).to_string(),
                limit: max_depth,
            });
        }
        let node = match self {
            ContractBody::Scalar(scalar) => ValueNode::Scalar(scalar.clone()),
            ContractBody::Pattern(regex) => ValueNode::Pattern(regex.clone()),
            ContractBody::Interpolated(interpolated) => {
                let resolved = interpolated.for_side(side);
                match resolved.as_literal() {
                    Some(text) => ValueNode::string(text),
                    None => ValueNode::Interpolated(resolved),
                }
            }
            ContractBody::Object(entries) => {
                let mut map = ObjectMap::new();
                for (key, value) in entries {
                    trail.push(Segment::Field(key.clone()));
                    let child = value.value_for(side).resolve_at(side, depth + 1, max_depth, trail)?;
                    trail.pop();
                    map.insert(key.clone(), child);
                }
                ValueNode::Object(map)
            }
            ContractBody::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    trail.push(Segment::Index(index));
                    resolved.push(item.value_for(side).resolve_at(side, depth + 1, max_depth, trail)?);
                    trail.pop();
                }
                ValueNode::Array(resolved)
            }
            ContractBody::Dual { .. } => {
                return self.value_for(side).resolve_at(side, depth, max_depth, trail);
            }
        };
        Ok(node)
    }

    /// Move every direct child out of this node.
    fn take_children(&mut self, out: &mut Vec<ContractBody>) {
        match self {
            ContractBody::Object(entries) => out.extend(entries.drain(..).map(|(_, value)| value)),
            ContractBody::Array(items) => out.append(items),
            ContractBody::Dual { client, server } => {
                let placeholder = || ContractBody::Scalar(Scalar::Null);
                out.push(std::mem::replace(client.as_mut(), placeholder()));
                out.push(std::mem::replace(server.as_mut(), placeholder()));
            }
            ContractBody::Scalar(_) | ContractBody::Pattern(_) | ContractBody::Interpolated(_) => {}
        }
    }
}

// Bodies come from contract descriptions and can nest arbitrarily deep, so
// they are torn down with an explicit stack instead of recursive drop glue.
impl Drop for ContractBody {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut body) = pending.pop() {
            body.take_children(&mut pending);
        }
    }
}

impl From<Scalar> for ContractBody {
    fn from(value: Scalar) -> Self {
        ContractBody::Scalar(value)
    }
}

impl From<&str> for ContractBody {
    fn from(value: &str) -> Self {
        ContractBody::Scalar(value.into())
    }
}

impl From<String> for ContractBody {
    fn from(value: String) -> Self {
        ContractBody::Scalar(value.into())
    }
}

impl From<i64> for ContractBody {
    fn from(value: i64) -> Self {
        ContractBody::Scalar(value.into())
    }
}

impl From<bool> for ContractBody {
    fn from(value: bool) -> Self {
        ContractBody::Scalar(value.into())
    }
}

impl From<Interpolated> for ContractBody {
    fn from(value: Interpolated) -> Self {
        ContractBody::Interpolated(value)
    }
}

impl From<serde_json::Value> for ContractBody {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ContractBody::Scalar(Scalar::Null),
            Value::Bool(b) => ContractBody::Scalar(Scalar::Bool(b)),
            Value::Number(n) => ContractBody::Scalar(Scalar::Number(n)),
            Value::String(s) => ContractBody::Scalar(Scalar::String(s)),
            Value::Array(items) => {
                ContractBody::Array(items.into_iter().map(ContractBody::from).collect())
            }
            Value::Object(map) => ContractBody::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ContractBody::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<ValueNode> for ContractBody {
    fn from(value: ValueNode) -> Self {
        match value {
            ValueNode::Scalar(scalar) => ContractBody::Scalar(scalar),
            ValueNode::Pattern(regex) => ContractBody::Pattern(regex),
            ValueNode::Interpolated(interpolated) => ContractBody::Interpolated(interpolated),
            ValueNode::Object(map) => ContractBody::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ContractBody::from(v)))
                    .collect(),
            ),
            ValueNode::Array(items) => {
                ContractBody::Array(items.into_iter().map(ContractBody::from).collect())
            }
        }
    }
}
