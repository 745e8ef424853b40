// SPDX-License-Identifier: MIT

//! Chat alert adapter (spec §1 "publishes status updates to a chat
//! channel", §7 "every transition into error... publishes a chat alert at
//! the appropriate severity").

use async_trait::async_trait;

/// Severity of a published chat alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Notice,
    Warning,
    Error,
    Critical,
}

impl AlertSeverity {
    /// The matching `tracing` level, used so alerts are observable from
    /// structured logs even when the chat relayer is unavailable
    /// (SPEC_FULL §7 ambient note). `tracing` has no `notice` level; it is
    /// mapped to `info`.
    pub fn tracing_level(self) -> tracing::Level {
        match self {
            AlertSeverity::Notice => tracing::Level::INFO,
            AlertSeverity::Warning => tracing::Level::WARN,
            AlertSeverity::Error | AlertSeverity::Critical => tracing::Level::ERROR,
        }
    }
}

/// Publishes status updates to a chat channel. The messaging transport
/// itself is an external collaborator (spec §1) — this trait is the seam.
#[async_trait]
pub trait ChatNotifier: Send + Sync + 'static {
    async fn alert(&self, severity: AlertSeverity, message: &str);
}

/// Notifier that only logs via `tracing`, for deployments without a chat
/// relayer configured.
#[derive(Clone, Copy, Default)]
pub struct TracingOnlyNotifier;

#[async_trait]
impl ChatNotifier for TracingOnlyNotifier {
    async fn alert(&self, severity: AlertSeverity, message: &str) {
        match severity {
            AlertSeverity::Notice => tracing::info!(alert = "notice", %message),
            AlertSeverity::Warning => tracing::warn!(alert = "warning", %message),
            AlertSeverity::Error => tracing::error!(alert = "error", %message),
            AlertSeverity::Critical => tracing::error!(alert = "critical", %message),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedAlert {
        pub severity_label: &'static str,
        pub message: String,
    }

    /// Fake notifier recording every alert for test assertions.
    #[derive(Clone, Default)]
    pub struct FakeChatNotifier {
        inner: Arc<Mutex<Vec<RecordedAlert>>>,
    }

    impl FakeChatNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn alerts(&self) -> Vec<RecordedAlert> {
            self.inner.lock().clone()
        }
    }

    #[async_trait]
    impl ChatNotifier for FakeChatNotifier {
        async fn alert(&self, severity: AlertSeverity, message: &str) {
            let severity_label = match severity {
                AlertSeverity::Notice => "notice",
                AlertSeverity::Warning => "warning",
                AlertSeverity::Error => "error",
                AlertSeverity::Critical => "critical",
            };
            self.inner
                .lock()
                .push(RecordedAlert { severity_label, message: message.to_string() });
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
