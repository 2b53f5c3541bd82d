//! Error and Result module.

use std::error::Error as StdError;
use std::fmt;

use crate::proto::{ConnectionInput, ConnectionState};

/// Result type often returned from methods that can have `h2-core` `Error`s.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur handling HTTP/2 protocol state.
///
/// Only two kinds of error escape this crate: protocol violations and
/// flow-control window overflow. The embedder maps them to the GOAWAY
/// codes `PROTOCOL_ERROR` and `FLOW_CONTROL_ERROR` respectively.
pub struct Error {
    inner: Box<ErrorImpl>,
}

struct ErrorImpl {
    kind: Kind,
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// The peer violated the protocol, or the local side attempted an
    /// illegal operation. Fatal to the connection.
    Protocol(Protocol),
    /// A flow-control window would grow past the 31-bit maximum.
    FlowControl,
}

#[derive(Debug)]
pub(crate) enum Protocol {
    /// A header name contained an uppercase ASCII octet.
    UppercaseHeaderName,
    /// A header name or value carried leading or trailing whitespace.
    HeaderWhitespace,
    /// A `te` header had a value other than "trailers".
    InvalidTeValue,
    /// A connection-specific header appeared in a header block.
    ConnectionHeader,
    /// The same pseudo-header appeared twice in one block.
    DuplicatePseudoHeader,
    /// A pseudo-header followed a regular header.
    PseudoAfterRegular,
    /// A pseudo-header outside the five defined by RFC 7540.
    UnknownPseudoHeader,
    /// A trailer block contained pseudo-headers.
    PseudoInTrailer,
    /// A response header block without a `:status` pseudo-header.
    MissingStatus,
    /// A request header block with neither `:authority` nor `host`.
    MissingAuthority,
    /// `:authority` and `host` were both present but did not agree.
    MismatchedAuthority,
    /// More than one `host` header in a request block.
    DuplicateHostHeader,
    /// A frame payload exceeded the negotiated maximum frame size.
    FrameTooLarge,
    /// A connection input that is not legal in the current state.
    Transition(ConnectionState, ConnectionInput),
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(ErrorImpl { kind }),
        }
    }

    pub(crate) fn new_protocol(protocol: Protocol) -> Error {
        Error::new(Kind::Protocol(protocol))
    }

    pub(crate) fn new_flow_control() -> Error {
        Error::new(Kind::FlowControl)
    }

    /// Returns true if this was a protocol violation.
    pub fn is_protocol(&self) -> bool {
        matches!(self.inner.kind, Kind::Protocol(_))
    }

    /// Returns true if this was a flow-control window overflow.
    pub fn is_flow_control(&self) -> bool {
        matches!(self.inner.kind, Kind::FlowControl)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("h2_core::Error")
            .field(&self.inner.kind)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Protocol(ref protocol) => match *protocol {
                Protocol::UppercaseHeaderName => f.write_str("uppercase character in header name"),
                Protocol::HeaderWhitespace => {
                    f.write_str("header name or value surrounded by whitespace")
                }
                Protocol::InvalidTeValue => f.write_str("invalid value for te header"),
                Protocol::ConnectionHeader => {
                    f.write_str("connection-specific header field present")
                }
                Protocol::DuplicatePseudoHeader => f.write_str("duplicate pseudo-header field"),
                Protocol::PseudoAfterRegular => f.write_str("pseudo-header field out of sequence"),
                Protocol::UnknownPseudoHeader => f.write_str("unknown pseudo-header field"),
                Protocol::PseudoInTrailer => f.write_str("pseudo-header field in trailer"),
                Protocol::MissingStatus => {
                    f.write_str("response is missing the :status pseudo-header")
                }
                Protocol::MissingAuthority => {
                    f.write_str("request has neither an :authority nor a host header")
                }
                Protocol::MismatchedAuthority => {
                    f.write_str("mismatched :authority and host headers")
                }
                Protocol::DuplicateHostHeader => f.write_str("duplicate host header"),
                Protocol::FrameTooLarge => {
                    f.write_str("frame payload exceeds the negotiated maximum frame size")
                }
                Protocol::Transition(state, input) => write!(
                    f,
                    "invalid connection input {:?} in state {:?}",
                    input, state
                ),
            },
            Kind::FlowControl => {
                f.write_str("flow-control window may not grow past 2^31 - 1 octets")
            }
        }
    }
}

impl StdError for Error {}
