// SPDX-License-Identifier: MIT

use super::*;
use crate::config::DaqConfig;

#[tokio::test]
async fn builds_a_controller_that_activates_from_a_configured_preset() {
    let config = DaemonConfig {
        daq: DaqConfig { duration_ms: 10, ..Default::default() },
        presets: vec![serde_json::json!({
            "name": "streaming",
            "nodes": [
                { "type": "tf-roach-receiver", "name": "recv" },
                { "type": "terminator-time-data", "name": "term" },
            ],
            "connections": ["recv.out_0:term.in_0"],
        })],
        active_preset: Some("streaming".to_string()),
        ..Default::default()
    };

    let (controller, registry) = build_controller(&config);
    assert_eq!(registry.names(), vec!["streaming".to_string()]);
    assert_eq!(controller.duration(), 10);

    controller.activate().await.unwrap();
    assert_eq!(controller.status(), daq_core::DaqStatus::Activated);
}

#[test]
fn unknown_active_preset_logs_and_leaves_no_graph_configured() {
    let config = DaemonConfig { active_preset: Some("missing".to_string()), ..Default::default() };
    let (controller, _registry) = build_controller(&config);
    assert!(controller.stream_manager().active_preset_name().is_none());
}
