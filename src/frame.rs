//! Frame descriptors handed to the connection by the embedding layer.
//!
//! The core never touches the wire format. The embedder parses frames
//! (and HPACK-decodes header blocks) itself, then passes one of these
//! tagged descriptors in; the connection inspects the kind to drive its
//! state machine and hands the payload fields on to the stream layer.

use bytes::Bytes;

use crate::headers::HeaderField;

/// A stream identifier.
///
/// Identifiers are 31 bits on the wire; the high bit is reserved and
/// masked off here. Identifier `0` addresses the connection itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u32);

impl StreamId {
    /// Stream ID 0, the connection scope.
    pub const ZERO: StreamId = StreamId(0);

    /// The largest stream identifier, 2^31 - 1.
    pub const MAX: StreamId = StreamId(u32::MAX >> 1);

    /// Creates a `StreamId`, clearing the reserved high bit.
    pub fn new(id: u32) -> StreamId {
        StreamId(id & (u32::MAX >> 1))
    }

    /// Returns true if this addresses the connection rather than a stream.
    pub fn is_zero(self) -> bool {
        self == StreamId::ZERO
    }
}

impl From<u32> for StreamId {
    fn from(id: u32) -> StreamId {
        StreamId::new(id)
    }
}

impl From<StreamId> for u32 {
    fn from(id: StreamId) -> u32 {
        id.0
    }
}

/// A decoded frame, reduced to what the connection core needs.
#[derive(Debug)]
pub enum Frame {
    /// A HEADERS frame, together with any CONTINUATIONs, as one block.
    Headers {
        /// The stream the block arrived on.
        stream_id: StreamId,
        /// The HPACK-decoded header fields, in block order.
        fields: Vec<HeaderField>,
        /// Whether END_STREAM was set.
        end_stream: bool,
    },
    /// A DATA frame.
    Data {
        /// The stream the data arrived on.
        stream_id: StreamId,
        /// The frame payload.
        payload: Bytes,
        /// Whether END_STREAM was set.
        end_stream: bool,
    },
    /// A PUSH_PROMISE frame, together with any CONTINUATIONs.
    PushPromise {
        /// The stream the promise arrived on.
        stream_id: StreamId,
        /// The stream the peer reserves for the pushed response.
        promised_id: StreamId,
        /// The promised request's header fields, in block order.
        fields: Vec<HeaderField>,
    },
    /// A GOAWAY frame.
    Goaway {
        /// The highest stream the sender may still process.
        last_stream_id: StreamId,
        /// Opaque diagnostic data from the sender.
        debug_data: Bytes,
    },
    /// A WINDOW_UPDATE frame.
    WindowUpdate {
        /// The scoped stream, or [`StreamId::ZERO`] for the connection.
        stream_id: StreamId,
        /// The window size increment, at most 2^31 - 1.
        increment: u32,
    },
    /// A PING frame.
    Ping {
        /// The opaque 8-octet payload.
        payload: [u8; 8],
    },
}

impl Frame {
    /// The stream this frame addresses; [`StreamId::ZERO`] for frames
    /// scoped to the connection as a whole.
    pub fn stream_id(&self) -> StreamId {
        match *self {
            Frame::Headers { stream_id, .. }
            | Frame::Data { stream_id, .. }
            | Frame::PushPromise { stream_id, .. }
            | Frame::WindowUpdate { stream_id, .. } => stream_id,
            Frame::Goaway { .. } | Frame::Ping { .. } => StreamId::ZERO,
        }
    }
}
