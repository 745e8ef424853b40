// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! daq-wire: request/response wire types, routing-key parsing, and the
//! dispatcher that calls into a [`daq_engine::DaqControl`] implementation
//! (spec §4.7, the "consumed interface"). Owns none of the transport.

pub mod dispatch;
pub mod request;
pub mod response;
pub mod routing;

pub use dispatch::dispatch;
pub use request::{Request, RequestKind};
pub use response::{Response, ReturnCode};
pub use routing::Route;
