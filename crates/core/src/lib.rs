// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! daq-core: data model shared by the DAQ control & streaming-graph engine.

pub mod macros;

pub mod clock;
pub mod error;
pub mod preset;
pub mod run_context;
pub mod status;
pub mod stream;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{DaqError, DaqResult};
pub use preset::{Connection, NodeSpec, Preset};
pub use run_context::{FileIntent, RunContext, RunId};
pub use status::DaqStatus;
pub use stream::{StreamCommand, TriggerFlag};
