// SPDX-License-Identifier: MIT

//! Request dispatcher (spec §4.7, consumed interface): parses a request's
//! routing key and calls the matching [`DaqControl`] method.

use crate::request::{Request, RequestKind};
use crate::response::Response;
use crate::routing::{self, Route};
use daq_core::DaqError;
use daq_engine::DaqControl;
use serde_json::Value;

/// Dispatch one request against `control`, returning the reply the caller
/// would send back over the request bus (or discard, for batch actions).
pub async fn dispatch(request: &Request, control: &impl DaqControl) -> Response {
    match execute(request, control).await {
        Ok(payload) => Response::success(payload),
        Err(err) => Response::from_error(err),
    }
}

async fn execute(request: &Request, control: &impl DaqControl) -> Result<Option<Value>, DaqError> {
    let route = routing::parse(&request.rks)?;
    tracing::debug!(rks = %request.rks, kind = ?request.kind, "dispatching request");

    match (request.kind, route) {
        (RequestKind::Cmd, Route::ActivateDaq) => control.activate().await.map(|_| None),
        (RequestKind::Cmd, Route::DeactivateDaq) => control.deactivate().await.map(|_| None),
        (RequestKind::Cmd, Route::ReactivateDaq) => control.reactivate().await.map(|_| None),
        (RequestKind::Cmd, Route::StopRun) => control.stop_run().map(|_| None),
        (RequestKind::Cmd, Route::StartRun) => {
            let (duration_ms, filenames, descriptions) = parse_start_run_payload(request.payload.as_ref())?;
            control.start_run(duration_ms, filenames, descriptions).await.map(|_| None)
        }
        (RequestKind::Set, Route::ActiveConfig { stream, node, param }) => {
            log_stream_token(&stream);
            let cfg = config_payload(param.as_deref(), request.payload.as_ref())?;
            control.apply_config(&node, cfg).map(|_| None)
        }
        (RequestKind::Get, Route::ActiveConfig { stream, node, param }) => {
            log_stream_token(&stream);
            let dumped = control.dump_config(&node)?;
            Ok(Some(select_param(dumped, param.as_deref())))
        }
        (RequestKind::Cmd, Route::RunCommand { stream, node, command }) => {
            log_stream_token(&stream);
            let args = request.payload.clone().unwrap_or(Value::Null);
            let recognised = control.run_command(&node, &command, args)?;
            if recognised {
                Ok(None)
            } else {
                Err(DaqError::MethodNotFound(command))
            }
        }
        (RequestKind::Set, Route::Filename { index }) => {
            let value = single_string_value(request.payload.as_ref())?;
            control.set_filename(index, value).map(|_| None)
        }
        (RequestKind::Get, Route::Filename { index }) => {
            Ok(Some(Value::String(control.filename(index)?)))
        }
        (RequestKind::Set, Route::Description { index }) => {
            let value = single_string_value(request.payload.as_ref())?;
            control.set_description(index, value).map(|_| None)
        }
        (RequestKind::Get, Route::Description { index }) => {
            Ok(Some(Value::String(control.description(index)?)))
        }
        (RequestKind::Set, Route::Duration) => {
            let value = single_u64_value(request.payload.as_ref())?;
            control.set_duration(value).map(|_| None)
        }
        (RequestKind::Get, Route::Duration) => Ok(Some(Value::from(control.duration()))),
        (RequestKind::Set, Route::UseMonarch) => {
            let value = single_bool_value(request.payload.as_ref())?;
            control.set_use_monarch(value);
            Ok(None)
        }
        (RequestKind::Get, Route::UseMonarch) => Ok(Some(Value::Bool(control.use_monarch()))),
        (RequestKind::Get, Route::DaqStatus) => {
            let (status, status_value) = control.daq_status();
            Ok(Some(serde_json::json!({
                "server": { "status": status.to_string(), "status-value": status_value }
            })))
        }
        (kind, _) => Err(DaqError::InvalidKey(format!("{:?} not valid for {kind:?}", request.rks))),
    }
}

fn log_stream_token(stream: &str) {
    tracing::debug!(stream, "stream token carried for routing only, not used for binding lookup");
}

fn parse_start_run_payload(
    payload: Option<&Value>,
) -> Result<(Option<u64>, Vec<String>, Vec<String>), DaqError> {
    let Some(payload) = payload else {
        return Ok((None, Vec::new(), Vec::new()));
    };
    if !payload.is_object() {
        return Err(DaqError::BadPayload("start-run payload must be an object".to_string()));
    }

    let duration_ms = payload.get("duration").and_then(Value::as_u64);
    let filenames = string_list_field(payload, "filenames", "filename")?;
    let descriptions = string_list_field(payload, "descriptions", "description")?;

    Ok((duration_ms, filenames, descriptions))
}

/// Extract `payload[plural]` as a list of strings, falling back to a
/// single-element list from `payload[singular]`, or an empty list if
/// neither is present.
///
/// `plural` present but not an array is `bad-payload` (SPEC_FULL §9 open
/// question 1: the original casts unconditionally and would panic here;
/// the spec requires this to fail gracefully instead).
fn string_list_field(payload: &Value, plural: &str, singular: &str) -> Result<Vec<String>, DaqError> {
    if let Some(value) = payload.get(plural) {
        let list = value
            .as_array()
            .ok_or_else(|| DaqError::BadPayload(format!("{plural} must be an array")))?;
        return Ok(list.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());
    }
    if let Some(single) = payload.get(singular).and_then(Value::as_str) {
        return Ok(vec![single.to_string()]);
    }
    Ok(Vec::new())
}

/// Build the config object to hand `apply_config`: either the payload
/// itself (no `param`), or `{param: value}` extracted from `{values:[v]}`
/// or a bare value (spec §6 "full config or `{values:[v]}`").
fn config_payload(param: Option<&str>, payload: Option<&Value>) -> Result<Value, DaqError> {
    let payload = payload.ok_or_else(|| DaqError::BadPayload("missing config payload".to_string()))?;
    match param {
        None => Ok(payload.clone()),
        Some(param) => {
            let value = extract_single_value(payload)?;
            Ok(serde_json::json!({ param: value }))
        }
    }
}

fn select_param(dumped: Value, param: Option<&str>) -> Value {
    match param {
        None => dumped,
        Some(param) => dumped.get(param).cloned().unwrap_or(Value::Null),
    }
}

fn extract_single_value(payload: &Value) -> Result<Value, DaqError> {
    if let Some(values) = payload.get("values").and_then(Value::as_array) {
        return values
            .first()
            .cloned()
            .ok_or_else(|| DaqError::BadPayload("values array is empty".to_string()));
    }
    Ok(payload.clone())
}

fn single_string_value(payload: Option<&Value>) -> Result<String, DaqError> {
    let payload = payload.ok_or_else(|| DaqError::BadPayload("missing payload".to_string()))?;
    extract_single_value(payload)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DaqError::BadPayload("expected a string value".to_string()))
}

fn single_u64_value(payload: Option<&Value>) -> Result<u64, DaqError> {
    let payload = payload.ok_or_else(|| DaqError::BadPayload("missing payload".to_string()))?;
    extract_single_value(payload)?
        .as_u64()
        .ok_or_else(|| DaqError::BadPayload("expected a non-negative integer value".to_string()))
}

fn single_bool_value(payload: Option<&Value>) -> Result<bool, DaqError> {
    let payload = payload.ok_or_else(|| DaqError::BadPayload("missing payload".to_string()))?;
    extract_single_value(payload)?
        .as_bool()
        .ok_or_else(|| DaqError::BadPayload("expected a boolean value".to_string()))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
