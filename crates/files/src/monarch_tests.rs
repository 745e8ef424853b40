// SPDX-License-Identifier: MIT

use super::*;
use tempfile::tempdir;

fn channel(n: usize) -> Vec<ChannelMetadata> {
    (0..n)
        .map(|_| ChannelMetadata { voltage_offset: 0.0, voltage_range: 1.0, dac_gain: 1.0, bit_depth: 8, alignment: 4 })
        .collect()
}

#[test]
fn header_access_requires_preparing_stage() {
    let dir = tempdir().unwrap();
    let file = MonarchFile::new(dir.path().join("a.egg"));
    assert!(file.header().is_err());

    file.begin_prepare().unwrap();
    assert!(file.header().is_ok());
}

#[test]
fn get_stream_requires_writing_stage() {
    let dir = tempdir().unwrap();
    let file = MonarchFile::new(dir.path().join("a.egg"));
    file.begin_prepare().unwrap();
    assert!(file.get_stream(0).is_err());

    file.begin_writing(channel(1)).unwrap();
    assert!(file.get_stream(0).is_ok());
}

#[test]
fn out_of_range_stream_index_fails() {
    let dir = tempdir().unwrap();
    let file = MonarchFile::new(dir.path().join("a.egg"));
    file.begin_prepare().unwrap();
    file.begin_writing(channel(1)).unwrap();
    assert!(matches!(file.get_stream(5), Err(FileError::OutOfRange(5, 1))));
}

#[test]
fn finish_file_is_idempotent() {
    let dir = tempdir().unwrap();
    let file = MonarchFile::new(dir.path().join("a.egg"));
    file.begin_prepare().unwrap();
    file.begin_writing(channel(1)).unwrap();

    file.finish_file().unwrap();
    assert_eq!(file.stage(), FileStage::Finished);
    // Second finish is a no-op, not an error.
    file.finish_file().unwrap();
}

#[test]
fn finish_stream_closes_file_only_when_last_stream_released() {
    let dir = tempdir().unwrap();
    let file = MonarchFile::new(dir.path().join("a.egg"));
    file.begin_prepare().unwrap();
    file.begin_writing(channel(2)).unwrap();

    let _s0 = file.get_stream(0).unwrap();
    let _s1 = file.get_stream(1).unwrap();

    file.finish_stream(0, true).unwrap();
    assert_eq!(file.stage(), FileStage::Writing);

    file.finish_stream(1, true).unwrap();
    assert_eq!(file.stage(), FileStage::Finished);
}

#[test]
fn concurrent_writes_to_different_streams_succeed() {
    let dir = tempdir().unwrap();
    let file = std::sync::Arc::new(MonarchFile::new(dir.path().join("a.egg")));
    file.begin_prepare().unwrap();
    file.begin_writing(channel(2)).unwrap();

    let f0 = file.clone();
    let f1 = file.clone();
    let t0 = std::thread::spawn(move || {
        let s = f0.get_stream(0).unwrap();
        for _ in 0..50 {
            s.write_record(b"time-record").unwrap();
        }
    });
    let t1 = std::thread::spawn(move || {
        let s = f1.get_stream(1).unwrap();
        for _ in 0..50 {
            s.write_record(b"freq-record").unwrap();
        }
    });
    t0.join().unwrap();
    t1.join().unwrap();
}

#[test]
fn header_fields_round_trip() {
    let dir = tempdir().unwrap();
    let file = MonarchFile::new(dir.path().join("a.egg"));
    file.begin_prepare().unwrap();
    {
        let mut header = file.header().unwrap();
        header.description = "test run".to_string();
        header.run_duration_ms = 500;
    }
    assert_eq!(file.header().unwrap().description, "test run");
}
