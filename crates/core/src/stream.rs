// SPDX-License-Identifier: MIT

//! Stream datum contracts (spec §3): the tagged commands and record types
//! that conceptually traverse a graph connection.
//!
//! The graph runtime itself is out of scope (spec §1); this module only
//! models the shape of what flows across an edge so the file coordinator and
//! writer-alignment logic can be expressed and tested without a real
//! runtime.

use serde::{Deserialize, Serialize};

/// Command carried by a stream datum. A downstream consumer observes the
/// sequence `start (run)* stop` between non-terminal epochs, and `exit`
/// exactly once at the end of the graph's life (spec §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamCommand {
    None,
    Start,
    Stop,
    Run,
    Exit,
    Error,
}

/// Per-packet trigger flag plus the counters used to align time and
/// frequency streams (`pkt-in-batch` / `pkt-in-session`, glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFlag {
    pub triggered: bool,
    pub pkt_in_batch: u64,
    pub pkt_in_session: u64,
}

impl TriggerFlag {
    pub fn new(triggered: bool, pkt_in_batch: u64, pkt_in_session: u64) -> Self {
        Self { triggered, pkt_in_batch, pkt_in_session }
    }
}

/// Tracks whether the writer should mark the next triggered record as the
/// start of a new event (spec §8 invariant 5): `is_new_event` is `true` on
/// the first triggered packet in a streak and `false` thereafter, and the
/// streak restarts on any untriggered packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStreakTracker {
    in_streak: bool,
}

impl EventStreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next packet's trigger flag; returns whether this record
    /// should be marked `is_new_event`.
    pub fn observe(&mut self, trigger: &TriggerFlag) -> bool {
        if !trigger.triggered {
            self.in_streak = false;
            return false;
        }
        let is_new = !self.in_streak;
        self.in_streak = true;
        is_new
    }
}
