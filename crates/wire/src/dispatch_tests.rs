// SPDX-License-Identifier: MIT

use super::*;
use crate::request::{Request, RequestKind};
use crate::response::ReturnCode;
use async_trait::async_trait;
use daq_core::{DaqResult, DaqStatus};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct FakeControlState {
    calls: Vec<String>,
    configs: std::collections::HashMap<String, Value>,
    duration_ms: u64,
    use_monarch: bool,
    filenames: Vec<String>,
    descriptions: Vec<String>,
    known_commands: std::collections::HashSet<String>,
    fail_with: Option<DaqError>,
}

#[derive(Clone, Default)]
struct FakeControl {
    state: Arc<Mutex<FakeControlState>>,
}

impl FakeControl {
    fn new() -> Self {
        let mut state = FakeControlState { duration_ms: 1000, ..Default::default() };
        state.filenames = vec!["a.egg".to_string(), "b.egg".to_string()];
        state.descriptions = vec![String::new(), String::new()];
        state.known_commands.insert("reset".to_string());
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn fail_next_with(&self, err: DaqError) {
        self.state.lock().fail_with = Some(err);
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn take_failure(&self) -> Result<(), DaqError> {
        if let Some(err) = self.state.lock().fail_with.take() {
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl DaqControl for FakeControl {
    async fn activate(&self) -> DaqResult<()> {
        self.state.lock().calls.push("activate".to_string());
        self.take_failure()
    }
    async fn deactivate(&self) -> DaqResult<()> {
        self.state.lock().calls.push("deactivate".to_string());
        self.take_failure()
    }
    async fn reactivate(&self) -> DaqResult<()> {
        self.state.lock().calls.push("reactivate".to_string());
        self.take_failure()
    }
    async fn start_run(&self, duration_ms: Option<u64>, filenames: Vec<String>, descriptions: Vec<String>) -> DaqResult<()> {
        self.state.lock().calls.push(format!("start_run({duration_ms:?}, {filenames:?}, {descriptions:?})"));
        self.take_failure()
    }
    fn stop_run(&self) -> DaqResult<()> {
        self.state.lock().calls.push("stop_run".to_string());
        Ok(())
    }
    async fn cancel(&self) -> DaqResult<()> {
        self.state.lock().calls.push("cancel".to_string());
        Ok(())
    }
    fn apply_config(&self, node: &str, cfg: Value) -> DaqResult<()> {
        let mut state = self.state.lock();
        state.calls.push(format!("apply_config({node})"));
        if let Value::Object(map) = &cfg {
            let entry = state.configs.entry(node.to_string()).or_insert_with(|| Value::Object(Default::default()));
            if let Value::Object(existing) = entry {
                for (k, v) in map {
                    existing.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }
    fn dump_config(&self, node: &str) -> DaqResult<Value> {
        Ok(self.state.lock().configs.get(node).cloned().unwrap_or(Value::Object(Default::default())))
    }
    fn run_command(&self, node: &str, cmd: &str, _args: Value) -> DaqResult<bool> {
        let state = self.state.lock();
        Ok(state.known_commands.contains(&format!("{node}:{cmd}")) || state.known_commands.contains(cmd))
    }
    fn filename(&self, index: usize) -> DaqResult<String> {
        self.state.lock().filenames.get(index).cloned().ok_or_else(|| DaqError::OutOfRange(index.to_string()))
    }
    fn set_filename(&self, index: usize, value: String) -> DaqResult<()> {
        let mut state = self.state.lock();
        let len = state.filenames.len();
        *state.filenames.get_mut(index).ok_or(DaqError::OutOfRange(format!("index {index} (len {len})")))? = value;
        Ok(())
    }
    fn description(&self, index: usize) -> DaqResult<String> {
        self.state.lock().descriptions.get(index).cloned().ok_or_else(|| DaqError::OutOfRange(index.to_string()))
    }
    fn set_description(&self, index: usize, value: String) -> DaqResult<()> {
        let mut state = self.state.lock();
        let len = state.descriptions.len();
        *state.descriptions.get_mut(index).ok_or(DaqError::OutOfRange(format!("index {index} (len {len})")))? = value;
        Ok(())
    }
    fn duration(&self) -> u64 {
        self.state.lock().duration_ms
    }
    fn set_duration(&self, value: u64) -> DaqResult<()> {
        if value == 0 {
            return Err(DaqError::BadPayload("duration must be nonzero".to_string()));
        }
        self.state.lock().duration_ms = value;
        Ok(())
    }
    fn use_monarch(&self) -> bool {
        self.state.lock().use_monarch
    }
    fn set_use_monarch(&self, value: bool) {
        self.state.lock().use_monarch = value;
    }
    fn daq_status(&self) -> (DaqStatus, i32) {
        (DaqStatus::Activated, DaqStatus::Activated.value())
    }
}

#[tokio::test]
async fn activate_daq_dispatches_and_returns_success() {
    let control = FakeControl::new();
    let resp = dispatch(&Request::new(RequestKind::Cmd, "activate-daq"), &control).await;
    assert_eq!(resp.return_code, ReturnCode::Success);
    assert_eq!(control.calls(), vec!["activate".to_string()]);
}

#[tokio::test]
async fn start_run_extracts_duration_and_filenames() {
    let control = FakeControl::new();
    let req = Request::new(RequestKind::Cmd, "start-run")
        .with_payload(serde_json::json!({ "duration": 200, "filenames": ["/tmp/a.egg", "/tmp/b.egg"] }));
    let resp = dispatch(&req, &control).await;
    assert_eq!(resp.return_code, ReturnCode::Success);
    assert_eq!(control.calls(), vec!["start_run(Some(200), [\"/tmp/a.egg\", \"/tmp/b.egg\"], [])".to_string()]);
}

#[tokio::test]
async fn start_run_with_non_array_filenames_is_bad_payload() {
    let control = FakeControl::new();
    let req = Request::new(RequestKind::Cmd, "start-run")
        .with_payload(serde_json::json!({ "filenames": "/tmp/a.egg" }));
    let resp = dispatch(&req, &control).await;
    assert_eq!(resp.return_code, ReturnCode::MessageErrorBadPayload);
    assert!(control.calls().is_empty());
}

#[tokio::test]
async fn set_active_config_with_param_builds_single_key_object() {
    let control = FakeControl::new();
    let req = Request::new(RequestKind::Set, "active-config.ch0.freq-transform.fft-size")
        .with_payload(serde_json::json!({ "values": [4096] }));
    let resp = dispatch(&req, &control).await;
    assert_eq!(resp.return_code, ReturnCode::Success);

    let get_req = Request::new(RequestKind::Get, "active-config.ch0.freq-transform.fft-size");
    let get_resp = dispatch(&get_req, &control).await;
    assert_eq!(get_resp.payload, Some(serde_json::json!(4096)));
}

#[tokio::test]
async fn get_active_config_without_param_returns_whole_object() {
    let control = FakeControl::new();
    dispatch(
        &Request::new(RequestKind::Set, "active-config.ch0.freq-transform").with_payload(serde_json::json!({ "gain": 3 })),
        &control,
    )
    .await;
    let resp = dispatch(&Request::new(RequestKind::Get, "active-config.ch0.freq-transform"), &control).await;
    assert_eq!(resp.payload, Some(serde_json::json!({ "gain": 3 })));
}

#[tokio::test]
async fn run_command_unrecognised_maps_to_invalid_method() {
    let control = FakeControl::new();
    let req = Request::new(RequestKind::Cmd, "run-command.ch0.freq-transform.frobnicate");
    let resp = dispatch(&req, &control).await;
    assert_eq!(resp.return_code, ReturnCode::MessageErrorInvalidMethod);
}

#[tokio::test]
async fn filenames_out_of_range_reports_device_error() {
    let control = FakeControl::new();
    let req = Request::new(RequestKind::Get, "filename.9");
    let resp = dispatch(&req, &control).await;
    assert_eq!(resp.return_code, ReturnCode::DeviceError);
}

#[tokio::test]
async fn daq_status_reports_server_object() {
    let control = FakeControl::new();
    let resp = dispatch(&Request::new(RequestKind::Get, "daq-status"), &control).await;
    assert_eq!(resp.return_code, ReturnCode::Success);
    let payload = resp.payload.unwrap();
    assert_eq!(payload["server"]["status"], serde_json::json!("activated"));
    assert_eq!(payload["server"]["status-value"], serde_json::json!(2));
}

#[tokio::test]
async fn unrecognised_routing_key_is_invalid_key() {
    let control = FakeControl::new();
    let resp = dispatch(&Request::new(RequestKind::Get, "not-a-real-key"), &control).await;
    assert_eq!(resp.return_code, ReturnCode::MessageErrorInvalidKey);
}

#[tokio::test]
async fn duration_set_rejects_zero_as_bad_payload() {
    let control = FakeControl::new();
    let req = Request::new(RequestKind::Set, "duration").with_payload(serde_json::json!({ "values": [0] }));
    let resp = dispatch(&req, &control).await;
    assert_eq!(resp.return_code, ReturnCode::MessageErrorBadPayload);
}

#[tokio::test]
async fn kind_mismatch_for_cmd_only_route_is_invalid_key() {
    let control = FakeControl::new();
    let resp = dispatch(&Request::new(RequestKind::Get, "activate-daq"), &control).await;
    assert_eq!(resp.return_code, ReturnCode::MessageErrorInvalidKey);
}

#[tokio::test]
async fn fails_upstream_error_propagates_as_device_error() {
    let control = FakeControl::new();
    control.fail_next_with(DaqError::status("activate invalid in state running"));
    let resp = dispatch(&Request::new(RequestKind::Cmd, "activate-daq"), &control).await;
    assert_eq!(resp.return_code, ReturnCode::DeviceError);
}
