// SPDX-License-Identifier: MIT

//! DAQ status — the controller's state machine (spec §3, §4.5).

use serde::{Deserialize, Serialize};

/// One of the states the DAQ controller can be in.
///
/// See spec §4.5 for the full transition diagram; [`DaqStatus::can_transition_to`]
/// encodes the same graph so invariant 1 in spec §8 ("every observed transition
/// appears in the diagram") is enforceable in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DaqStatus {
    Deactivated,
    Activating,
    Activated,
    Running,
    Deactivating,
    Canceled,
    DoRestart,
    Done,
    Error,
}

crate::simple_display! {
    DaqStatus {
        Deactivated => "deactivated",
        Activating => "activating",
        Activated => "activated",
        Running => "running",
        Deactivating => "deactivating",
        Canceled => "canceled",
        DoRestart => "do-restart",
        Done => "done",
        Error => "error",
    }
}

impl DaqStatus {
    /// A numeric status value for the `daq-status` reply's `status-value` field,
    /// matching the original's `interpret_status` ordinal mapping.
    pub fn value(self) -> i32 {
        match self {
            DaqStatus::Deactivated => 0,
            DaqStatus::Activating => 1,
            DaqStatus::Activated => 2,
            DaqStatus::Running => 3,
            DaqStatus::Deactivating => 4,
            DaqStatus::DoRestart => 5,
            DaqStatus::Canceled => 6,
            DaqStatus::Done => 7,
            DaqStatus::Error => 8,
        }
    }

    /// Whether online-reconfiguration calls (apply/dump config, run-command)
    /// are permitted: only `activated` and `running`, per spec §4.5.
    pub fn bindings_available(self) -> bool {
        matches!(self, DaqStatus::Activated | DaqStatus::Running)
    }

    /// Whether `cancel()` from this state is a terminal no-op (already
    /// cancelled or done) — used to make repeated `cancel` idempotent.
    pub fn is_terminal(self) -> bool {
        matches!(self, DaqStatus::Canceled | DaqStatus::Done)
    }

    /// Validate a proposed transition against the diagram in spec §4.5.
    /// `cancel()` is allowed from any non-terminal state and is handled by
    /// the caller directly rather than through this table.
    pub fn can_transition_to(self, next: DaqStatus) -> bool {
        use DaqStatus::*;
        matches!(
            (self, next),
            (Deactivated, Activating)
                | (Activating, Activated)
                | (Activating, Error)
                | (Activating, Deactivated)
                | (Activated, Running)
                | (Activated, Deactivating)
                | (Running, Activated)
                | (Running, Deactivating)
                | (Running, DoRestart)
                | (Activating, DoRestart)
                | (Deactivating, Deactivated)
                | (DoRestart, Activating)
                | (_, Canceled)
                | (Canceled, Done)
                | (Error, Deactivated)
        )
    }
}

impl Default for DaqStatus {
    fn default() -> Self {
        DaqStatus::Deactivated
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
