// SPDX-License-Identifier: MIT

use super::*;

#[yare::parameterized(
    activate = { "activate-daq", Route::ActivateDaq },
    deactivate = { "deactivate-daq", Route::DeactivateDaq },
    reactivate = { "reactivate-daq", Route::ReactivateDaq },
    start_run = { "start-run", Route::StartRun },
    stop_run = { "stop-run", Route::StopRun },
    daq_status = { "daq-status", Route::DaqStatus },
    duration = { "duration", Route::Duration },
    use_monarch = { "use-monarch", Route::UseMonarch },
    filename_default = { "filename", Route::Filename { index: 0 } },
    filename_indexed = { "filename.2", Route::Filename { index: 2 } },
    description_default = { "description", Route::Description { index: 0 } },
    description_indexed = { "description.1", Route::Description { index: 1 } },
)]
fn parses_fixed_routing_keys(rks: &str, expected: Route) {
    assert_eq!(parse(rks).unwrap(), expected);
}

#[test]
fn active_config_without_param() {
    let route = parse("active-config.ch0.freq-transform").unwrap();
    assert_eq!(
        route,
        Route::ActiveConfig { stream: "ch0".to_string(), node: "freq-transform".to_string(), param: None }
    );
}

#[test]
fn active_config_with_param() {
    let route = parse("active-config.ch0.freq-transform.fft-size").unwrap();
    assert_eq!(
        route,
        Route::ActiveConfig {
            stream: "ch0".to_string(),
            node: "freq-transform".to_string(),
            param: Some("fft-size".to_string())
        }
    );
}

#[test]
fn run_command_requires_all_four_segments() {
    let route = parse("run-command.ch0.freq-transform.reset").unwrap();
    assert_eq!(
        route,
        Route::RunCommand {
            stream: "ch0".to_string(),
            node: "freq-transform".to_string(),
            command: "reset".to_string()
        }
    );
    assert!(parse("run-command.ch0.freq-transform").is_err());
}

#[test]
fn unrecognised_key_is_invalid() {
    assert!(matches!(parse("not-a-real-key"), Err(DaqError::InvalidKey(_))));
}

#[test]
fn non_numeric_index_is_invalid() {
    assert!(matches!(parse("filename.abc"), Err(DaqError::InvalidKey(_))));
}
