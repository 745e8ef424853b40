// SPDX-License-Identifier: MIT

//! Routing-key path parser (spec §6's table, first token after the target
//! queue). The "stream" token in `active-config.<stream>.<node>[.<param>]`
//! and `run-command.<stream>.<node>.<cmd>` is logged but not used for
//! binding lookup: bindings are keyed by logical node name, and the stream
//! segment exists in the original wire format purely for routing within
//! the external message bus.

use daq_core::DaqError;

/// A parsed routing-key path, independent of the request's `kind`
/// (get/set/cmd) — some keys are only meaningful for one kind, checked by
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ActivateDaq,
    DeactivateDaq,
    ReactivateDaq,
    StartRun,
    StopRun,
    ActiveConfig { stream: String, node: String, param: Option<String> },
    RunCommand { stream: String, node: String, command: String },
    Filename { index: usize },
    Description { index: usize },
    Duration,
    UseMonarch,
    DaqStatus,
}

/// Parse a dot-separated routing-key path into a [`Route`]. Unrecognised
/// shapes produce `DaqError::InvalidKey`, which the dispatcher reports as
/// `message-error-invalid-key`.
pub fn parse(rks: &str) -> Result<Route, DaqError> {
    let tokens: Vec<&str> = rks.split('.').collect();

    match tokens.as_slice() {
        ["activate-daq"] => Ok(Route::ActivateDaq),
        ["deactivate-daq"] => Ok(Route::DeactivateDaq),
        ["reactivate-daq"] => Ok(Route::ReactivateDaq),
        ["start-run"] => Ok(Route::StartRun),
        ["stop-run"] => Ok(Route::StopRun),
        ["daq-status"] => Ok(Route::DaqStatus),
        ["duration"] => Ok(Route::Duration),
        ["use-monarch"] => Ok(Route::UseMonarch),
        ["filename"] => Ok(Route::Filename { index: 0 }),
        ["filename", idx] => Ok(Route::Filename { index: parse_index(rks, idx)? }),
        ["description"] => Ok(Route::Description { index: 0 }),
        ["description", idx] => Ok(Route::Description { index: parse_index(rks, idx)? }),
        ["active-config", stream, node] => {
            Ok(Route::ActiveConfig { stream: stream.to_string(), node: node.to_string(), param: None })
        }
        ["active-config", stream, node, param] => Ok(Route::ActiveConfig {
            stream: stream.to_string(),
            node: node.to_string(),
            param: Some(param.to_string()),
        }),
        ["run-command", stream, node, command] => Ok(Route::RunCommand {
            stream: stream.to_string(),
            node: node.to_string(),
            command: command.to_string(),
        }),
        _ => Err(DaqError::InvalidKey(rks.to_string())),
    }
}

fn parse_index(rks: &str, token: &str) -> Result<usize, DaqError> {
    token.parse::<usize>().map_err(|_| DaqError::InvalidKey(rks.to_string()))
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
