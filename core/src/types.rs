//! Response records and request fragments for the PolyAnalyst API.
//!
//! # Design
//! Missing keys decode to empty values (`#[serde(default)]`) so a node
//! without an `errMsg` is simply a node without an error. Execution
//! statistics have no fixed schema on the server side and are kept as the
//! raw JSON object.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decode `null` as the type's empty value, the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One processing node of a project graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Node {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub node_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(rename = "errMsg", deserialize_with = "null_as_default")]
    pub err_msg: String,
}

impl Node {
    pub fn has_error(&self) -> bool {
        !self.err_msg.is_empty()
    }
}

/// Body of `GET /project/nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,
}

/// Body of `GET /project/execution-statistics`, keyed exactly as the server
/// sent it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ExecutionStatistics {
    fields: Map<String, Value>,
}

impl ExecutionStatistics {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for ExecutionStatistics {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Identifies a node to run when only part of a project should execute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeRef {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

impl NodeRef {
    pub fn new(name: &str, node_type: &str) -> Self {
        Self {
            name: name.to_string(),
            node_type: node_type.to_string(),
        }
    }
}
