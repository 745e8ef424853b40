// SPDX-License-Identifier: MIT

//! Monarch file wrapper (spec §4.4): a thread-safe facade over the
//! on-disk, HDF5-based record format. The real HDF5 container is out of
//! scope; this module models it with a header side-file plus one
//! length-prefixed record file per stream, which is the part of the
//! contract that is load-bearing for the rest of the system — the stage
//! state machine, the header-access guard, and the per-stream acquisition
//! contract (SPEC_FULL §4.4).

use crate::error::FileError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Stage of a Monarch file's life-cycle. Strictly monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileStage {
    Initialized,
    Preparing,
    Writing,
    Finished,
}

impl FileStage {
    fn name(self) -> &'static str {
        match self {
            FileStage::Initialized => "initialized",
            FileStage::Preparing => "preparing",
            FileStage::Writing => "writing",
            FileStage::Finished => "finished",
        }
    }
}

/// Per-channel metadata installed when streams are opened (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub voltage_offset: f64,
    pub voltage_range: f64,
    pub dac_gain: f64,
    pub bit_depth: u8,
    pub alignment: u8,
}

/// File header: run duration, timestamp, description (spec §4.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    pub run_duration_ms: u64,
    pub timestamp_epoch_ms: u64,
    pub description: String,
}

/// Scoped exclusive guard over the header. Only one holder may read or
/// modify header metadata at a time.
pub struct HeaderGuard<'a> {
    header: parking_lot::MutexGuard<'a, Header>,
}

impl std::ops::Deref for HeaderGuard<'_> {
    type Target = Header;
    fn deref(&self) -> &Header {
        &self.header
    }
}

impl std::ops::DerefMut for HeaderGuard<'_> {
    fn deref_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

struct StreamSlot {
    metadata: ChannelMetadata,
    file: Mutex<File>,
    acquired: std::sync::atomic::AtomicBool,
}

/// A per-stream write handle. Writes through this handle are not
/// serialised by the wrapper; the caller guarantees single-threaded access
/// to a given stream (spec §4.4). Concurrent writes to *different* streams
/// of the same file are permitted and expected.
pub struct StreamHandle {
    index: usize,
    slot: Arc<StreamSlot>,
}

impl StreamHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Append one length-prefixed record.
    pub fn write_record(&self, payload: &[u8]) -> Result<(), FileError> {
        let mut file = self.slot.file.lock();
        file.write_all(&(payload.len() as u32).to_le_bytes())?;
        file.write_all(payload)?;
        Ok(())
    }

    pub fn metadata(&self) -> &ChannelMetadata {
        &self.slot.metadata
    }
}

/// Thread-safe facade over one Monarch-format on-disk container.
pub struct MonarchFile {
    path: PathBuf,
    stage: Mutex<FileStage>,
    header: Mutex<Header>,
    streams: Mutex<Vec<Arc<StreamSlot>>>,
}

impl MonarchFile {
    /// Declare a new file at `path`, in the `initialized` stage.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stage: Mutex::new(FileStage::Initialized),
            header: Mutex::new(Header::default()),
            streams: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stage(&self) -> FileStage {
        *self.stage.lock()
    }

    /// `initialized` → `preparing`. Writes nothing yet; just opens the
    /// header for exclusive access.
    pub fn begin_prepare(&self) -> Result<(), FileError> {
        let mut stage = self.stage.lock();
        if *stage != FileStage::Initialized {
            return Err(FileError::BadStage(stage.name()));
        }
        *stage = FileStage::Preparing;
        Ok(())
    }

    /// Exclusive header access, valid only in the `preparing` stage
    /// (spec §4.4: "Attempts to access header outside preparing... fail
    /// with bad-stage").
    pub fn header(&self) -> Result<HeaderGuard<'_>, FileError> {
        let stage = *self.stage.lock();
        if stage != FileStage::Preparing {
            return Err(FileError::BadStage(stage.name()));
        }
        Ok(HeaderGuard { header: self.header.lock() })
    }

    /// `preparing` → `writing`: opens one record file per channel and
    /// installs its metadata.
    pub fn begin_writing(&self, channels: Vec<ChannelMetadata>) -> Result<(), FileError> {
        let mut stage = self.stage.lock();
        if *stage != FileStage::Preparing {
            return Err(FileError::BadStage(stage.name()));
        }

        // Commit the header to disk alongside the record files.
        let header_path = self.path.with_extension("header.json");
        std::fs::write(&header_path, serde_json::to_vec_pretty(&*self.header.lock())?)?;

        let mut slots = Vec::with_capacity(channels.len());
        for (i, metadata) in channels.into_iter().enumerate() {
            let stream_path =
                self.path.with_extension(format!("stream-{i}.bin"));
            let file = File::create(stream_path)?;
            slots.push(Arc::new(StreamSlot {
                metadata,
                file: Mutex::new(file),
                acquired: std::sync::atomic::AtomicBool::new(false),
            }));
        }
        *self.streams.lock() = slots;
        *stage = FileStage::Writing;
        Ok(())
    }

    /// Acquire stream `i`, valid only in the `writing` stage.
    pub fn get_stream(&self, i: usize) -> Result<StreamHandle, FileError> {
        let stage = *self.stage.lock();
        if stage != FileStage::Writing {
            return Err(FileError::BadStage(stage.name()));
        }
        let streams = self.streams.lock();
        let slot = streams.get(i).ok_or(FileError::OutOfRange(i, streams.len()))?.clone();
        slot.acquired.store(true, std::sync::atomic::Ordering::Release);
        Ok(StreamHandle { index: i, slot })
    }

    /// Release stream `i`. If `finish_file_if_last` is set and every
    /// stream is now released, transitions the file to `finished`.
    pub fn finish_stream(&self, i: usize, finish_file_if_last: bool) -> Result<(), FileError> {
        let streams = self.streams.lock();
        let slot = streams.get(i).ok_or(FileError::OutOfRange(i, streams.len()))?;
        if !slot.acquired.swap(false, std::sync::atomic::Ordering::AcqRel) {
            return Err(FileError::StreamNotAcquired(i));
        }
        let all_released = streams.iter().all(|s| !s.acquired.load(std::sync::atomic::Ordering::Acquire));
        drop(streams);

        if finish_file_if_last && all_released {
            self.finish_file()?;
        }
        Ok(())
    }

    /// `writing` → `finished`. Idempotent: subsequent calls are no-ops.
    pub fn finish_file(&self) -> Result<(), FileError> {
        let mut stage = self.stage.lock();
        if *stage == FileStage::Finished {
            return Ok(());
        }
        if *stage != FileStage::Writing {
            return Err(FileError::BadStage(stage.name()));
        }
        for slot in self.streams.lock().iter() {
            let _ = slot.file.lock().flush();
        }
        *stage = FileStage::Finished;
        Ok(())
    }
}

#[cfg(test)]
#[path = "monarch_tests.rs"]
mod tests;
