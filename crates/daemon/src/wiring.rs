// SPDX-License-Identifier: MIT

//! Wires the `daq-core` / `daq-adapters` / `daq-files` / `daq-engine`
//! crates together into one runnable [`Controller`], the way
//! `oj-daemon`'s startup path assembles its `Runtime` from config (spec
//! §1: "concrete DAQ node algorithms... are out of scope" — every node
//! type declared by a configured preset is bound to the no-op adapters
//! until a deployment registers a real builder for that type).

use crate::config::DaemonConfig;
use daq_adapters::{NodeBuilder, NoopGraphRuntime, NoopNodeBinder, RealHostSignal, TracingOnlyNotifier};
use daq_core::SystemClock;
use daq_engine::{ControllerConfig, DaqController, PresetRegistry, StreamManager};
use daq_files::FileCoordinator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The concrete controller type this daemon runs: a real preset-driven
/// graph shape over no-op node/runtime adapters, real file coordination,
/// a `tracing`-only chat notifier, the system clock, and a real SIGINT.
pub type Controller = DaqController<NoopGraphRuntime, TracingOnlyNotifier, SystemClock, RealHostSignal>;

/// Build the preset registry, stream manager, and DAQ controller from a
/// loaded [`DaemonConfig`]. Registration/configuration failures are
/// logged and left for the operator to fix via `set-active-config` etc.
/// rather than aborting startup — the original's "DAQ config is optional"
/// philosophy extends to "a bad preset config still boots a daemon you
/// can inspect and fix".
pub fn build_controller(config: &DaemonConfig) -> (Controller, PresetRegistry) {
    let registry = PresetRegistry::new();
    for preset_config in &config.presets {
        if let Err(err) = registry.register(preset_config) {
            tracing::error!(%err, "failed to register preset from config");
        }
    }

    let mut builders: HashMap<String, NodeBuilder> = HashMap::new();
    for name in registry.names() {
        if let Ok(preset) = registry.get(&name) {
            for node in &preset.nodes {
                builders.entry(node.node_type.clone()).or_insert_with(NoopNodeBinder::builder);
            }
        }
    }

    let stream_manager = StreamManager::new(registry.clone(), builders, NoopGraphRuntime::new);
    if let Some(active) = &config.active_preset {
        if let Err(err) = stream_manager.configure(active, &config.node_configs) {
            tracing::error!(%err, preset = %active, "failed to configure graph from config");
        }
    }

    let files = Arc::new(FileCoordinator::new(config.daq.file_root.clone()));

    let controller_config = ControllerConfig {
        activate_at_startup: config.daq.activate_at_startup,
        startup_activation_delay: Duration::from_millis(config.daq.startup_activation_delay_ms),
        restart_delay: Duration::from_millis(config.daq.restart_delay_ms),
        reactivate_delay: Duration::from_millis(config.daq.reactivate_delay_ms),
        channel_metadata: config.daq.channels.clone(),
    };

    let controller = DaqController::new(
        stream_manager,
        files,
        TracingOnlyNotifier,
        SystemClock,
        RealHostSignal,
        controller_config,
    );

    if config.daq.duration_ms > 0 {
        let _ = controller.set_duration(config.daq.duration_ms);
    }
    controller.set_use_monarch(config.daq.use_monarch);

    (controller, registry)
}

#[cfg(test)]
#[path = "wiring_tests.rs"]
mod tests;
