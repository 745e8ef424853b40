// SPDX-License-Identifier: MIT

//! Reply surface (spec §6, §7): a return code plus an optional payload and
//! message, built from whatever `DaqError` the dispatched operation raised.

use daq_core::DaqError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The five reply codes from spec §6's table, exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnCode {
    Success,
    DeviceError,
    MessageErrorBadPayload,
    MessageErrorInvalidKey,
    MessageErrorInvalidMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub return_code: ReturnCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn success(payload: Option<Value>) -> Self {
        Self { return_code: ReturnCode::Success, payload, message: None }
    }

    pub fn ok() -> Self {
        Self::success(None)
    }

    /// Classify a [`DaqError`] into the reply-code taxonomy (spec §7): only
    /// the payload-shape, routing-key, and unrecognised-command buckets get
    /// their own code; every other internal fault (config, status, device,
    /// not-found, out-of-range, missing bindings, cancellation) is reported
    /// as `device-error`, matching spec scenario S3's "during deactivated
    /// it returns device-error" for the `NoBindings` case specifically.
    pub fn from_error(err: DaqError) -> Self {
        let return_code = match &err {
            DaqError::BadPayload(_) => ReturnCode::MessageErrorBadPayload,
            DaqError::InvalidKey(_) => ReturnCode::MessageErrorInvalidKey,
            DaqError::MethodNotFound(_) => ReturnCode::MessageErrorInvalidMethod,
            _ => ReturnCode::DeviceError,
        };
        Self { return_code, payload: None, message: Some(err.to_string()) }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
