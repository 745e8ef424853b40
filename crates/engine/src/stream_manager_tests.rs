// SPDX-License-Identifier: MIT

use super::*;
use daq_adapters::{builder_with_command, FakeGraphRuntime, FakeNodeBinder};
use daq_core::test_support::streaming_preset;
use std::collections::HashMap;
use std::sync::Arc;

fn manager_with_streaming_preset() -> StreamManager<FakeGraphRuntime> {
    let registry = PresetRegistry::new();
    registry.register(&preset_json()).unwrap();

    let mut builders: HashMap<String, NodeBuilder> = HashMap::new();
    builders.insert("tf-roach-receiver".to_string(), builder_with_command("reset"));
    builders.insert("terminator-time-data".to_string(), builder_with_command("flush"));

    StreamManager::new(registry, builders, FakeGraphRuntime::new)
}

fn preset_json() -> serde_json::Value {
    let preset = streaming_preset();
    serde_json::json!({
        "name": preset.name,
        "nodes": preset.nodes.iter().map(|n| serde_json::json!({"type": n.node_type, "name": n.name})).collect::<Vec<_>>(),
        "connections": ["recv.out_0:term.in_0"],
    })
}

#[test]
fn configure_builds_bindings_for_every_node() {
    let mgr = manager_with_streaming_preset();
    mgr.configure("streaming", &HashMap::new()).unwrap();
    let bindings = mgr.bindings();
    assert_eq!(bindings.len(), 2);
    assert!(bindings.contains_key("recv"));
    assert!(bindings.contains_key("term"));
}

#[test]
fn configure_rejects_unknown_node_type() {
    let registry = PresetRegistry::new();
    registry
        .register(&serde_json::json!({ "name": "p", "nodes": [{"type": "mystery-node"}] }))
        .unwrap();
    let mgr: StreamManager<FakeGraphRuntime> = StreamManager::new(registry, HashMap::new(), FakeGraphRuntime::new);
    assert!(matches!(mgr.configure("p", &HashMap::new()), Err(DaqError::Config(_))));
}

#[test]
fn configure_twice_without_teardown_fails() {
    let mgr = manager_with_streaming_preset();
    mgr.configure("streaming", &HashMap::new()).unwrap();
    assert!(mgr.configure("streaming", &HashMap::new()).is_err());
    mgr.teardown();
    mgr.configure("streaming", &HashMap::new()).unwrap();
}

#[test]
fn applies_matching_config_at_configure_time() {
    let mgr = manager_with_streaming_preset();
    let mut configs = HashMap::new();
    configs.insert("recv".to_string(), serde_json::json!({ "fft-size": 2048 }));
    mgr.configure("streaming", &configs).unwrap();

    let dumped = mgr.binding("recv").unwrap().dump_config();
    assert_eq!(dumped.get("fft-size").and_then(|v| v.as_i64()), Some(2048));
}

#[test]
fn must_reset_until_reset_called_then_acquire_succeeds() {
    let mgr = manager_with_streaming_preset();
    mgr.configure("streaming", &HashMap::new()).unwrap();
    assert!(mgr.must_reset());
    mgr.reset().unwrap();
    assert!(!mgr.must_reset());

    let handle = mgr.acquire_runtime().unwrap();
    assert!(mgr.acquire_runtime().is_err(), "second acquire must fail while held");
    mgr.release_runtime(handle);
    assert!(mgr.must_reset(), "runtime is single-use per activation");
}

#[test]
fn run_string_orders_by_connection_dependency() {
    let mgr = manager_with_streaming_preset();
    mgr.configure("streaming", &HashMap::new()).unwrap();
    assert_eq!(mgr.run_string(), "recv -> term");
}

#[test]
fn run_string_empty_before_configure() {
    let registry = PresetRegistry::new();
    let mgr: StreamManager<FakeGraphRuntime> = StreamManager::new(registry, HashMap::new(), FakeGraphRuntime::new);
    assert_eq!(mgr.run_string(), "");
}

#[test]
fn teardown_clears_bindings() {
    let mgr = manager_with_streaming_preset();
    mgr.configure("streaming", &HashMap::new()).unwrap();
    mgr.teardown();
    assert!(mgr.bindings().is_empty());
    assert!(mgr.active_preset_name().is_none());
}

#[test]
fn reconfigure_if_needed_rebuilds_after_teardown() {
    let mgr = manager_with_streaming_preset();
    let mut configs = HashMap::new();
    configs.insert("recv".to_string(), serde_json::json!({ "fft-size": 2048 }));
    mgr.configure("streaming", &configs).unwrap();
    mgr.teardown();
    assert!(mgr.bindings().is_empty());

    mgr.reconfigure_if_needed().unwrap();
    assert_eq!(mgr.active_preset_name().as_deref(), Some("streaming"));
    let dumped = mgr.binding("recv").unwrap().dump_config();
    assert_eq!(dumped.get("fft-size").and_then(|v| v.as_i64()), Some(2048));
}

#[test]
fn reconfigure_if_needed_is_a_noop_when_graph_already_live() {
    let mgr = manager_with_streaming_preset();
    mgr.configure("streaming", &HashMap::new()).unwrap();
    mgr.reconfigure_if_needed().unwrap();
    assert_eq!(mgr.bindings().len(), 2);
}

#[test]
fn reconfigure_if_needed_fails_when_never_configured() {
    let registry = PresetRegistry::new();
    let mgr: StreamManager<FakeGraphRuntime> = StreamManager::new(registry, HashMap::new(), FakeGraphRuntime::new);
    assert!(matches!(mgr.reconfigure_if_needed(), Err(DaqError::Status(_))));
}

#[test]
fn fake_binder_smoke() {
    let binder: Arc<dyn NodeBinder> = Arc::new(FakeNodeBinder::new().with_command("noop"));
    assert!(binder.run_command("noop", &serde_json::json!({})).unwrap());
}
