// SPDX-License-Identifier: MIT

//! Preset data model (spec §3, §4.1): a named, immutable template mapping a
//! logical pipeline shape to an instantiable spec.

use crate::error::DaqError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node declared by a preset: its logical name and its node-type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node type, looked up against the stream manager's builder table.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Logical name within the graph. Defaults to `node_type` if absent in config.
    pub name: String,
}

/// A single directed connection, e.g. `"recv.out_0:term.in_0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub src_node: String,
    pub src_port: String,
    pub dst_node: String,
    pub dst_port: String,
}

impl Connection {
    /// Parse a `"src-node.out_i:dst-node.in_j"` connection string.
    pub fn parse(s: &str) -> Result<Self, DaqError> {
        let (src, dst) = s
            .split_once(':')
            .ok_or_else(|| DaqError::config(format!("bad connection string: {s:?}")))?;
        let (src_node, src_port) = src
            .split_once('.')
            .ok_or_else(|| DaqError::config(format!("bad connection endpoint: {src:?}")))?;
        let (dst_node, dst_port) = dst
            .split_once('.')
            .ok_or_else(|| DaqError::config(format!("bad connection endpoint: {dst:?}")))?;
        Ok(Self {
            src_node: src_node.to_string(),
            src_port: src_port.to_string(),
            dst_node: dst_node.to_string(),
            dst_port: dst_port.to_string(),
        })
    }
}

/// A named, immutable graph template: a map of logical-name → node-type plus
/// a set of connections. Registered process-wide and looked up by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    pub connections: Vec<Connection>,
}

impl Preset {
    /// Parse and validate a preset from a raw param tree (spec §4.1).
    ///
    /// Invariants enforced here: logical names unique within the preset;
    /// every connection endpoint references a declared node.
    pub fn from_config(value: &serde_json::Value) -> Result<Self, DaqError> {
        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DaqError::config("preset missing required key 'name'"))?
            .to_string();

        let nodes_value = value
            .get("nodes")
            .and_then(|v| v.as_array())
            .ok_or_else(|| DaqError::config("preset missing required array 'nodes'"))?;

        let mut nodes = Vec::with_capacity(nodes_value.len());
        let mut seen = BTreeMap::new();
        for (i, n) in nodes_value.iter().enumerate() {
            let node_type = n
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| DaqError::config(format!("nodes[{i}] missing required key 'type'")))?
                .to_string();
            let node_name =
                n.get("name").and_then(|v| v.as_str()).map(str::to_string).unwrap_or_else(|| node_type.clone());

            if let Some(prev) = seen.insert(node_name.clone(), i) {
                return Err(DaqError::config(format!(
                    "duplicate logical node name {node_name:?} (nodes[{prev}] and nodes[{i}])"
                )));
            }
            nodes.push(NodeSpec { node_type, name: node_name });
        }

        let mut connections = Vec::new();
        if let Some(conns) = value.get("connections").and_then(|v| v.as_array()) {
            for c in conns {
                let s = c
                    .as_str()
                    .ok_or_else(|| DaqError::config("connections entries must be strings"))?;
                let conn = Connection::parse(s)?;
                if !seen.contains_key(&conn.src_node) {
                    return Err(DaqError::config(format!(
                        "connection {s:?} references undeclared node {:?}",
                        conn.src_node
                    )));
                }
                if !seen.contains_key(&conn.dst_node) {
                    return Err(DaqError::config(format!(
                        "connection {s:?} references undeclared node {:?}",
                        conn.dst_node
                    )));
                }
                connections.push(conn);
            }
        }

        Ok(Self { name, nodes, connections })
    }

    pub fn node(&self, logical_name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == logical_name)
    }
}

#[cfg(test)]
#[path = "preset_tests.rs"]
mod tests;
