// SPDX-License-Identifier: MIT

use daq_core::DaqError;
use thiserror::Error;

/// Errors from the Monarch file wrapper and the file coordinator.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("operation not valid in file stage {0}")]
    BadStage(&'static str),

    #[error("stream index {0} out of range (0..{1})")]
    OutOfRange(usize, usize),

    #[error("file {0:?} is already finished")]
    FinishedFile(String),

    #[error("stream {0} is not currently acquired")]
    StreamNotAcquired(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<FileError> for DaqError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::FinishedFile(name) => DaqError::status(format!("file already finished: {name}")),
            FileError::OutOfRange(i, n) => {
                DaqError::OutOfRange(format!("index {i} out of range (0..{n})"))
            }
            other => DaqError::device(other.to_string()),
        }
    }
}
