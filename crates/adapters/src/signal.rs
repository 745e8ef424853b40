// SPDX-License-Identifier: MIT

//! Host-process signal adapter (spec §4.5, §6 "Process signals": "SIGINT
//! from the controller signals fatal error to the host process; the core
//! does not install signal handlers" — it only *raises* one).

/// Raises a signal against the surrounding host process. The core never
/// installs a handler for it (spec §6); it only ever raises SIGINT, on
/// entry to [`daq_core::DaqStatus::Error`], so the daemon's own handler can
/// shut down cleanly.
pub trait HostSignal: Send + Sync + 'static {
    fn raise_sigint(&self);
}

/// Sends a real `SIGINT` to the current process via `nix`.
#[derive(Clone, Copy, Default)]
pub struct RealHostSignal;

impl HostSignal for RealHostSignal {
    fn raise_sigint(&self) {
        if let Err(err) = nix::sys::signal::raise(nix::sys::signal::Signal::SIGINT) {
            tracing::error!(%err, "failed to raise SIGINT");
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Records how many times `raise_sigint` was called, without touching
    /// the real process.
    #[derive(Clone, Default)]
    pub struct FakeHostSignal {
        count: Arc<AtomicUsize>,
    }

    impl FakeHostSignal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn count(&self) -> usize {
            self.count.load(Ordering::Acquire)
        }
    }

    impl HostSignal for FakeHostSignal {
        fn raise_sigint(&self) {
            self.count.fetch_add(1, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeHostSignal;
    use super::*;

    #[test]
    fn fake_records_each_raise() {
        let signal = FakeHostSignal::new();
        signal.raise_sigint();
        signal.raise_sigint();
        assert_eq!(signal.count(), 2);
    }
}
