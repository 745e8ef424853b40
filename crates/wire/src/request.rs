// SPDX-License-Identifier: MIT

//! Request surface (spec §6): transport-agnostic, as consumed from the
//! request dispatcher. The AMQP transport itself is out of scope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The operation kind carried alongside a routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Get,
    Set,
    Cmd,
}

/// One request arriving over the (external) request bus: an operation
/// kind, a routing-key path, and an optional payload tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub kind: RequestKind,
    pub rks: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl Request {
    pub fn new(kind: RequestKind, rks: impl Into<String>) -> Self {
        Self { kind, rks: rks.into(), payload: None }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}
