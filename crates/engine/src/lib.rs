// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! daq-engine: preset registry, stream manager, DAQ controller, and batch
//! executor (spec §4.1, §4.2, §4.5, §4.6).

pub mod batch;
pub mod controller;
pub mod preset_registry;
pub mod stream_manager;

pub use batch::{Action, ActionKind, BatchExecutor, BatchOutcome};
pub use controller::{ControllerConfig, DaqControl, DaqController};
pub use preset_registry::PresetRegistry;
pub use stream_manager::StreamManager;
