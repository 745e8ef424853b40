// SPDX-License-Identifier: MIT

//! Test builders and proptest strategies, gated behind `test-support` so
//! downstream crates can depend on them from their own test code without
//! pulling proptest into a production build.

use crate::preset::{Connection, NodeSpec, Preset};
use proptest::prelude::*;

/// Build a minimal single-node, no-connection preset for tests.
pub fn trivial_preset(name: &str, node_type: &str) -> Preset {
    Preset {
        name: name.to_string(),
        nodes: vec![NodeSpec { node_type: node_type.to_string(), name: "n0".to_string() }],
        connections: vec![],
    }
}

/// Build the two-node `streaming` preset used by spec scenario S1.
pub fn streaming_preset() -> Preset {
    Preset {
        name: "streaming".to_string(),
        nodes: vec![
            NodeSpec { node_type: "tf-roach-receiver".to_string(), name: "recv".to_string() },
            NodeSpec { node_type: "terminator-time-data".to_string(), name: "term".to_string() },
        ],
        connections: vec![Connection {
            src_node: "recv".to_string(),
            src_port: "out_0".to_string(),
            dst_node: "term".to_string(),
            dst_port: "in_0".to_string(),
        }],
    }
}

/// A proptest strategy generating syntactically-valid logical node names.
pub fn arb_node_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_map(|s| s)
}
