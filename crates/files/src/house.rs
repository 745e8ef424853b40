// SPDX-License-Identifier: MIT

//! The file coordinator ("butterfly house", spec §4.3): a process-wide
//! singleton arbitrating shared output files across multiple writer nodes.

use crate::error::FileError;
use crate::monarch::{ChannelMetadata, FileStage, MonarchFile};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for `prepare_all`: the run-wide metadata written into
/// every declared file's header, plus the channel metadata installed on
/// its streams (spec §4.3, §6).
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub run_duration_ms: u64,
    pub timestamp_epoch_ms: u64,
    pub channels: Vec<ChannelMetadata>,
}

struct FileRecord {
    filename: String,
    description: String,
    monarch: Arc<MonarchFile>,
}

/// Arbitrates multi-writer access to shared output files. Declaration and
/// stage transitions take a coordinator-wide lock; per-file I/O does not
/// hold that lock (spec §5) — it is protected by the [`MonarchFile`]'s own
/// internal locking.
#[derive(Default)]
pub struct FileCoordinator {
    files: Mutex<Vec<FileRecord>>,
    root: Mutex<PathBuf>,
}

impl FileCoordinator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { files: Mutex::new(Vec::new()), root: Mutex::new(root.into()) }
    }

    /// A writer node announces intent to use `filename`. Reference-counted
    /// via `Arc` clone: a second `declare` of the same still-open filename
    /// returns a handle to the same underlying file.
    pub fn declare(&self, filename: &str) -> Result<Arc<MonarchFile>, FileError> {
        let mut files = self.files.lock();
        if let Some(record) = files.iter().find(|r| r.filename == filename) {
            if record.monarch.stage() == FileStage::Finished {
                return Err(FileError::FinishedFile(filename.to_string()));
            }
            return Ok(record.monarch.clone());
        }

        let path = self.root.lock().join(filename);
        let monarch = Arc::new(MonarchFile::new(path));
        files.push(FileRecord { filename: filename.to_string(), description: String::new(), monarch: monarch.clone() });
        tracing::info!(filename, "file declared");
        Ok(monarch)
    }

    /// Transition every `initialized` record to `preparing` (write header)
    /// and then to `writing` (open streams), at run start.
    pub fn prepare_all(&self, config: &PrepareConfig) -> Result<(), FileError> {
        let monarchs: Vec<(String, String, Arc<MonarchFile>)> = {
            let files = self.files.lock();
            files
                .iter()
                .filter(|r| r.monarch.stage() == FileStage::Initialized)
                .map(|r| (r.filename.clone(), r.description.clone(), r.monarch.clone()))
                .collect()
        };

        for (filename, description, monarch) in monarchs {
            monarch.begin_prepare()?;
            {
                let mut header = monarch.header()?;
                header.run_duration_ms = config.run_duration_ms;
                header.timestamp_epoch_ms = config.timestamp_epoch_ms;
                header.description = description;
            }
            monarch.begin_writing(config.channels.clone())?;
            tracing::info!(filename, "file prepared and writing");
        }
        Ok(())
    }

    /// Finish a single file by name. A file already `finished` is a no-op.
    pub fn finish(&self, filename: &str) -> Result<(), FileError> {
        let monarch = {
            let files = self.files.lock();
            files.iter().find(|r| r.filename == filename).map(|r| r.monarch.clone())
        };
        match monarch {
            Some(m) => {
                m.finish_file()?;
                tracing::info!(filename, "file finished");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Finish every currently-declared file.
    pub fn finish_all(&self) -> Result<(), FileError> {
        let monarchs: Vec<Arc<MonarchFile>> = self.files.lock().iter().map(|r| r.monarch.clone()).collect();
        for monarch in monarchs {
            monarch.finish_file()?;
        }
        tracing::info!("all files finished");
        Ok(())
    }

    fn with_record<T>(&self, index: usize, f: impl FnOnce(&FileRecord) -> T) -> Result<T, FileError> {
        let files = self.files.lock();
        let record = files.get(index).ok_or(FileError::OutOfRange(index, files.len()))?;
        Ok(f(record))
    }

    fn with_record_mut<T>(&self, index: usize, f: impl FnOnce(&mut FileRecord) -> T) -> Result<T, FileError> {
        let mut files = self.files.lock();
        let len = files.len();
        let record = files.get_mut(index).ok_or(FileError::OutOfRange(index, len))?;
        Ok(f(record))
    }

    pub fn filename(&self, index: usize) -> Result<String, FileError> {
        self.with_record(index, |r| r.filename.clone())
    }

    pub fn set_filename(&self, index: usize, filename: impl Into<String>) -> Result<(), FileError> {
        self.with_record_mut(index, |r| r.filename = filename.into())
    }

    pub fn description(&self, index: usize) -> Result<String, FileError> {
        self.with_record(index, |r| r.description.clone())
    }

    pub fn set_description(&self, index: usize, description: impl Into<String>) -> Result<(), FileError> {
        self.with_record_mut(index, |r| r.description = description.into())
    }

    pub fn count(&self) -> usize {
        self.files.lock().len()
    }

    /// Remove every declared record, regardless of stage. Used to reset
    /// state between runs that don't reuse the same filenames.
    pub fn clear(&self) {
        self.files.lock().clear();
    }
}

#[cfg(test)]
#[path = "house_tests.rs"]
mod tests;
