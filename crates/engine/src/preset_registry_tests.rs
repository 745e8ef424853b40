// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

fn preset_json(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "nodes": [{ "type": "tf-roach-receiver", "name": "recv" }],
    })
}

#[test]
fn register_then_get_roundtrips() {
    let registry = PresetRegistry::new();
    registry.register(&preset_json("streaming")).unwrap();
    let preset = registry.get("streaming").unwrap();
    assert_eq!(preset.name, "streaming");
}

#[test]
fn get_unknown_preset_fails_not_found() {
    let registry = PresetRegistry::new();
    assert!(matches!(registry.get("nope"), Err(DaqError::NotFound(_))));
}

#[test]
fn register_rejects_invalid_config() {
    let registry = PresetRegistry::new();
    let bad = json!({ "nodes": [] });
    assert!(matches!(registry.register(&bad), Err(DaqError::Config(_))));
}

#[test]
fn registering_identical_contents_twice_is_idempotent() {
    let registry = PresetRegistry::new();
    registry.register(&preset_json("streaming")).unwrap();
    registry.register(&preset_json("streaming")).unwrap();
    assert_eq!(registry.names(), vec!["streaming".to_string()]);
}

#[test]
fn registering_different_contents_replaces() {
    let registry = PresetRegistry::new();
    registry.register(&preset_json("streaming")).unwrap();
    let replacement = json!({
        "name": "streaming",
        "nodes": [
            { "type": "tf-roach-receiver", "name": "recv" },
            { "type": "terminator-time-data", "name": "term" },
        ],
    });
    registry.register(&replacement).unwrap();
    assert_eq!(registry.get("streaming").unwrap().nodes.len(), 2);
}
