// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! daq-adapters: external-collaborator traits (graph runtime, node binder,
//! chat notifier) plus fakes for tests, per spec §9 "Singletons... should
//! be injected rather than reached for as a global, so tests can
//! substitute fakes."

pub mod binder;
pub mod noop;
pub mod notify;
pub mod runtime;
pub mod signal;

pub use binder::{NodeBinder, NodeBuilder};
pub use noop::{NoopGraphRuntime, NoopNodeBinder};
pub use notify::{AlertSeverity, ChatNotifier, TracingOnlyNotifier};
pub use runtime::{GraphRuntime, RunOutcome, RuntimeHandle};
pub use signal::{HostSignal, RealHostSignal};

#[cfg(any(test, feature = "test-support"))]
pub use binder::fake::{builder_with_command, FakeNodeBinder};
#[cfg(any(test, feature = "test-support"))]
pub use notify::fake::{FakeChatNotifier, RecordedAlert};
#[cfg(any(test, feature = "test-support"))]
pub use runtime::fake::{FakeGraphRuntime, RuntimeCall};
#[cfg(any(test, feature = "test-support"))]
pub use signal::fake::FakeHostSignal;
