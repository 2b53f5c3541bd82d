#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(test, deny(rust_2018_idioms))]

//! # h2-core
//!
//! Connection state and header validation primitives for HTTP/2
//! endpoints.
//!
//! This crate is the protocol core of an HTTP/2 endpoint: the
//! connection-level state machine that gates which frame operations are
//! legal at each point of the connection's lifecycle, and the
//! header-block pipeline that enforces RFC 7540 §8.1.2 on inbound and
//! outbound header fields. Everything around that core — the frame
//! codec, HPACK state, per-stream state machines, flow-control
//! accounting, buffering and I/O — belongs to the embedding layer,
//! which feeds decoded [frame descriptors](crate::frame) and header
//! blocks in and acts on the verdicts.
//!
//! The core is synchronous, performs no I/O, and never blocks: every
//! operation is a total function of the current state and its input.
//! Feed it events serially, in wire order.
//!
//! ```
//! use h2_core::frame::StreamId;
//! use h2_core::{Connection, HeaderField};
//!
//! let mut conn: Connection<()> = Connection::new();
//! let request = vec![
//!     HeaderField::from((":method", "GET")),
//!     HeaderField::from((":scheme", "https")),
//!     HeaderField::from((":authority", "example.com")),
//!     HeaderField::from((":path", "/")),
//! ];
//! let block = conn.send_headers(StreamId::new(1), request, true).unwrap();
//! assert_eq!(block.len(), 4);
//! ```

pub use crate::error::{Error, Result};
pub use crate::headers::{HeaderField, Sensitivity};
pub use crate::proto::{
    guard_increment_window, Connection, ConnectionInput, ConnectionState, StateMachine,
    MAX_WINDOW_SIZE,
};

mod error;
pub mod frame;
pub mod headers;
mod proto;
