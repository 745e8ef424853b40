// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn noop_runtime_run_blocks_until_cancel() {
    let runtime = NoopGraphRuntime::new();
    runtime.resume().await.unwrap();
    runtime.pause().await.unwrap();

    let handle = tokio::spawn({
        let runtime = runtime.clone();
        async move { runtime.run().await }
    });

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!handle.is_finished());

    runtime.cancel().await.unwrap();
    let outcome = handle.await.unwrap();
    assert_eq!(outcome, RunOutcome::Normal);
}

#[test]
fn noop_binder_echoes_config_and_recognises_no_commands() {
    let binder = NoopNodeBinder::new();
    binder.apply_config(&serde_json::json!({ "gain": 3 })).unwrap();
    assert_eq!(binder.dump_config(), serde_json::json!({ "gain": 3 }));
    assert_eq!(binder.run_command("anything", &serde_json::Value::Null).unwrap(), false);
}

#[test]
fn noop_binder_builder_produces_independent_instances() {
    let builder = NoopNodeBinder::builder();
    let a = builder();
    let b = builder();
    a.apply_config(&serde_json::json!({ "k": 1 })).unwrap();
    assert_eq!(a.dump_config(), serde_json::json!({ "k": 1 }));
    assert_eq!(b.dump_config(), serde_json::json!({}));
}
