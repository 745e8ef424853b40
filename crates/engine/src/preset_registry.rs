// SPDX-License-Identifier: MIT

//! Node-graph preset registry (spec §4.1): named templates mapping a
//! logical pipeline shape to an instantiable spec, registered process-wide
//! and looked up by name.

use daq_core::{DaqError, DaqResult, Preset};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-wide preset registry. `Clone`-cheap (`Arc<RwLock<..>>>`,
/// mirroring the teacher's `runbook_cache: Mutex<HashMap<...>>` pattern in
/// `oj-engine::Runtime`) so it can be shared between the controller and a
/// future admin surface without a second source of truth.
#[derive(Clone, Default)]
pub struct PresetRegistry {
    presets: Arc<RwLock<HashMap<String, Preset>>>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a preset from a raw param tree. Idempotent on
    /// identical contents; replacing an existing preset with different
    /// contents is allowed and logged.
    pub fn register(&self, config: &serde_json::Value) -> DaqResult<()> {
        let preset = Preset::from_config(config)?;
        let mut presets = self.presets.write();
        match presets.get(&preset.name) {
            Some(existing) if *existing == preset => {
                tracing::debug!(preset = %preset.name, "preset registered (identical contents)");
            }
            Some(_) => {
                tracing::info!(preset = %preset.name, "preset replaced with different contents");
            }
            None => {
                tracing::info!(preset = %preset.name, nodes = preset.nodes.len(), "preset registered");
            }
        }
        presets.insert(preset.name.clone(), preset);
        Ok(())
    }

    /// Look up a preset by name. Returned value is a read-only clone.
    pub fn get(&self, name: &str) -> DaqResult<Preset> {
        self.presets
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DaqError::NotFound(format!("preset {name:?}")))
    }

    pub fn names(&self) -> Vec<String> {
        self.presets.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "preset_registry_tests.rs"]
mod tests;
