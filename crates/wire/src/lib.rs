// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the gateway: admin requests/responses and the
//! in-process bus envelope that carries the same taxonomy.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod bus;
mod framing;
mod request;
mod response;

pub use bus::{BusBody, BusEvent, Envelope};
pub use framing::{decode, encode, read_framed, read_message, write_framed, write_message, ProtocolError};
pub use request::{Request, TagSpec};
pub use response::{GroupSummary, NodeSummary, Response, TagValue};
