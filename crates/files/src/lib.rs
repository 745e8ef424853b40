// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! daq-files: the file coordinator ("butterfly house") and the Monarch
//! file wrapper it arbitrates access to.

pub mod error;
pub mod house;
pub mod monarch;

pub use error::FileError;
pub use house::{FileCoordinator, PrepareConfig};
pub use monarch::{ChannelMetadata, FileStage, Header, HeaderGuard, MonarchFile, StreamHandle};
