// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

fn streaming_config() -> serde_json::Value {
    json!({
        "name": "streaming",
        "nodes": [
            { "type": "tf-roach-receiver", "name": "recv" },
            { "type": "terminator-time-data", "name": "term" },
        ],
        "connections": ["recv.out_0:term.in_0"],
    })
}

#[test]
fn parses_minimal_preset() {
    let preset = Preset::from_config(&streaming_config()).unwrap();
    assert_eq!(preset.name, "streaming");
    assert_eq!(preset.nodes.len(), 2);
    assert_eq!(preset.connections.len(), 1);
    assert_eq!(preset.connections[0].src_node, "recv");
    assert_eq!(preset.connections[0].dst_port, "in_0");
}

#[test]
fn node_name_defaults_to_type() {
    let config = json!({
        "name": "p",
        "nodes": [{ "type": "trigger" }],
    });
    let preset = Preset::from_config(&config).unwrap();
    assert_eq!(preset.nodes[0].name, "trigger");
}

#[test]
fn duplicate_logical_names_rejected() {
    let config = json!({
        "name": "p",
        "nodes": [
            { "type": "a", "name": "x" },
            { "type": "b", "name": "x" },
        ],
    });
    let err = Preset::from_config(&config).unwrap_err();
    assert!(matches!(err, DaqError::Config(_)));
}

#[test]
fn connection_to_undeclared_node_rejected() {
    let config = json!({
        "name": "p",
        "nodes": [{ "type": "a", "name": "a" }],
        "connections": ["a.out_0:missing.in_0"],
    });
    let err = Preset::from_config(&config).unwrap_err();
    assert!(matches!(err, DaqError::Config(_)));
}

#[test]
fn missing_name_is_config_error() {
    let config = json!({ "nodes": [] });
    assert!(matches!(Preset::from_config(&config), Err(DaqError::Config(_))));
}

#[test]
fn missing_nodes_array_is_config_error() {
    let config = json!({ "name": "p" });
    assert!(matches!(Preset::from_config(&config), Err(DaqError::Config(_))));
}

#[test]
fn connection_parse_rejects_malformed_strings() {
    assert!(Connection::parse("no-colon-here").is_err());
    assert!(Connection::parse("a:b").is_err());
    assert!(Connection::parse("a.out_0:b").is_err());
}
