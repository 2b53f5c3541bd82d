//! The HTTP/2 connection state machine and its owning connection.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{Error, Protocol};
use crate::frame::{Frame, StreamId};
use crate::headers::{self, HeaderField, HeaderValidationFlags};
use crate::proto::flow_control::{
    guard_increment_window, DEFAULT_INITIAL_WINDOW_SIZE,
};
use crate::Result;

/// The lifecycle of an HTTP/2 connection.
///
/// ```not_rust
///                  +------+
///      send H      |      |      recv H
///     ,------------| idle |------------.
///     v            |      |            v
/// +--------+       +------+       +--------+
/// | client |                      | server |
/// |  open  |                      |  open  |
/// +--------+                      +--------+
///     |                                |
///     |  send GA /    +--------+       |  send GA /
///     |  recv GA      |        |       |  recv GA
///     `-------------->| closed |<------'
///                     |        |
///                     +--------+
///
///        H:  HEADERS frame (with implied CONTINUATIONs)
///        GA: GOAWAY frame
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No HEADERS exchanged yet.
    Idle,
    /// This endpoint sent the first HEADERS: it is the client.
    ClientOpen,
    /// The peer sent the first HEADERS: this endpoint is the server.
    ServerOpen,
    /// A GOAWAY was sent or received. Terminal.
    Closed,
}

/// One frame operation, from the connection's point of view.
///
/// HEADERS and their CONTINUATION frames count as a single jumbo frame;
/// the protocol forbids interleaving anything between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionInput {
    /// Send a HEADERS frame.
    SendHeaders,
    /// Send a PUSH_PROMISE frame.
    SendPushPromise,
    /// Send a DATA frame.
    SendData,
    /// Send a GOAWAY frame.
    SendGoaway,
    /// Send a WINDOW_UPDATE frame.
    SendWindowUpdate,
    /// Send a PING frame.
    SendPing,
    /// Receive a HEADERS frame.
    RecvHeaders,
    /// Receive a PUSH_PROMISE frame.
    RecvPushPromise,
    /// Receive a DATA frame.
    RecvData,
    /// Receive a GOAWAY frame.
    RecvGoaway,
    /// Receive a WINDOW_UPDATE frame.
    RecvWindowUpdate,
    /// Receive a PING frame.
    RecvPing,
}

// A transition may carry a side effect, run after the state is updated.
// None are defined today; the slot stays so connection-level
// notifications (settings exchange completion and the like) can hook in
// without reshaping the table.
type Effect = fn(&mut StateMachine);

// Every legal (state, input) pair and its target state. Anything absent
// is a protocol violation and immediately closes the connection.
fn transition(
    state: ConnectionState,
    input: ConnectionInput,
) -> Option<(Option<Effect>, ConnectionState)> {
    use self::ConnectionInput::*;
    use self::ConnectionState::*;

    let next = match (state, input) {
        (Idle, SendHeaders) => ClientOpen,
        (Idle, RecvHeaders) => ServerOpen,

        // Open, client side. The peer may push; we may not.
        (ClientOpen, SendHeaders)
        | (ClientOpen, SendData)
        | (ClientOpen, SendWindowUpdate)
        | (ClientOpen, SendPing)
        | (ClientOpen, RecvHeaders)
        | (ClientOpen, RecvPushPromise)
        | (ClientOpen, RecvData)
        | (ClientOpen, RecvWindowUpdate)
        | (ClientOpen, RecvPing) => ClientOpen,
        (ClientOpen, SendGoaway) | (ClientOpen, RecvGoaway) => Closed,

        // Open, server side. We may push; the peer may not.
        (ServerOpen, SendHeaders)
        | (ServerOpen, SendPushPromise)
        | (ServerOpen, SendData)
        | (ServerOpen, SendWindowUpdate)
        | (ServerOpen, SendPing)
        | (ServerOpen, RecvHeaders)
        | (ServerOpen, RecvData)
        | (ServerOpen, RecvWindowUpdate)
        | (ServerOpen, RecvPing) => ServerOpen,
        (ServerOpen, SendGoaway) | (ServerOpen, RecvGoaway) => Closed,

        _ => return None,
    };
    Some((None, next))
}

/// The connection-level state machine.
///
/// A pure transducer: the state after processing input *n* is a
/// deterministic function of inputs 1..n. Illegal inputs close the
/// connection before the error surfaces, so every later operation fails
/// too.
#[derive(Debug)]
pub struct StateMachine {
    state: ConnectionState,
}

impl StateMachine {
    /// Creates a state machine in [`ConnectionState::Idle`].
    pub fn new() -> StateMachine {
        StateMachine {
            state: ConnectionState::Idle,
        }
    }

    /// Processes one input.
    ///
    /// Legal inputs move the machine along the transition table. Any
    /// (state, input) pair outside the table sets the state to
    /// [`ConnectionState::Closed`] and returns a protocol error.
    pub fn process(&mut self, input: ConnectionInput) -> Result<()> {
        match transition(self.state, input) {
            Some((effect, next)) => {
                trace!("connection {:?} --{:?}--> {:?}", self.state, input, next);
                self.state = next;
                if let Some(effect) = effect {
                    effect(self);
                }
                Ok(())
            }
            None => {
                let state = self.state;
                debug!("invalid connection input {:?} in state {:?}", input, state);
                self.state = ConnectionState::Closed;
                Err(Error::new_protocol(Protocol::Transition(state, input)))
            }
        }
    }

    /// The current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Default for StateMachine {
    fn default() -> StateMachine {
        StateMachine::new()
    }
}

/// A low-level HTTP/2 connection.
///
/// Routes frame operations through the connection [`StateMachine`] and
/// a map of embedder-owned stream objects. The stream objects are
/// opaque here: per-stream state machines, flow accounting and event
/// dispatch belong to the embedding layer, which registers objects with
/// [`begin_stream`] and reads them back with [`stream`].
///
/// Send operations validate their header blocks before the connection
/// commits to sending, so a rejected block leaves the state machine
/// untouched and no frame goes out. Received frames step the machine
/// first: the wire event already happened, and a malformed block after
/// a legal frame is fatal anyway.
///
/// [`begin_stream`]: Connection::begin_stream
/// [`stream`]: Connection::stream
#[derive(Debug)]
pub struct Connection<S> {
    state_machine: StateMachine,
    streams: HashMap<StreamId, S>,
    max_outbound_frame_size: Option<usize>,
    max_inbound_frame_size: Option<usize>,
    // Credit we extend to the peer, grown by our WINDOW_UPDATEs.
    local_window: i64,
    // Credit the peer extends to us, grown by received WINDOW_UPDATEs.
    remote_window: i64,
}

impl<S> Connection<S> {
    /// Creates a connection in the idle state with the protocol-default
    /// flow-control windows and no negotiated frame-size limits.
    pub fn new() -> Connection<S> {
        Connection {
            state_machine: StateMachine::new(),
            streams: HashMap::new(),
            max_outbound_frame_size: None,
            max_inbound_frame_size: None,
            local_window: DEFAULT_INITIAL_WINDOW_SIZE,
            remote_window: DEFAULT_INITIAL_WINDOW_SIZE,
        }
    }

    /// The current connection lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state_machine.state()
    }

    /// The connection-scoped window this endpoint extends to the peer.
    pub fn local_window(&self) -> i64 {
        self.local_window
    }

    /// The connection-scoped window the peer extends to this endpoint.
    pub fn remote_window(&self) -> i64 {
        self.remote_window
    }

    /// The negotiated maximum size of frames the peer may send.
    pub fn max_inbound_frame_size(&self) -> Option<usize> {
        self.max_inbound_frame_size
    }

    /// Sets the maximum size of frames the peer may send.
    pub fn set_max_inbound_frame_size(&mut self, max: Option<usize>) {
        self.max_inbound_frame_size = max;
    }

    /// The negotiated maximum size of frames this endpoint may send.
    pub fn max_outbound_frame_size(&self) -> Option<usize> {
        self.max_outbound_frame_size
    }

    /// Sets the maximum size of frames this endpoint may send.
    pub fn set_max_outbound_frame_size(&mut self, max: Option<usize>) {
        self.max_outbound_frame_size = max;
    }

    /// Registers the embedder's stream object for `id`, returning any
    /// object it displaces.
    pub fn begin_stream(&mut self, id: StreamId, stream: S) -> Option<S> {
        trace!("begin stream {:?}", id);
        self.streams.insert(id, stream)
    }

    /// The stream object registered for `id`, if any.
    pub fn stream(&self, id: StreamId) -> Option<&S> {
        self.streams.get(&id)
    }

    /// Mutable access to the stream object registered for `id`.
    pub fn stream_mut(&mut self, id: StreamId) -> Option<&mut S> {
        self.streams.get_mut(&id)
    }

    /// Sends a header block on `id`.
    ///
    /// The block is normalized and outbound-validated first; on failure
    /// no frame may be emitted and the connection state is unchanged.
    /// Returns the wire-ready block for the embedder's HPACK encoder.
    /// `end_stream` retires the stream object.
    pub fn send_headers(
        &mut self,
        id: StreamId,
        headers: Vec<HeaderField>,
        end_stream: bool,
    ) -> Result<Vec<HeaderField>> {
        let flags = self.outbound_flags();
        let block = headers::validate_outbound(headers::normalize_outbound(headers, flags), flags)?;
        self.state_machine.process(ConnectionInput::SendHeaders)?;
        trace!(
            "send HEADERS on {:?}: {} fields, end_stream={}",
            id,
            block.len(),
            end_stream
        );
        if end_stream {
            self.streams.remove(&id);
        }
        Ok(block)
    }

    /// Sends a DATA frame on `id`.
    ///
    /// Payloads larger than the negotiated maximum outbound frame size
    /// are rejected before the connection state moves.
    pub fn send_data(&mut self, id: StreamId, data: Bytes, end_stream: bool) -> Result<()> {
        if let Some(max) = self.max_outbound_frame_size {
            if data.len() > max {
                debug!("refusing {} octet DATA frame, maximum is {}", data.len(), max);
                return Err(Error::new_protocol(Protocol::FrameTooLarge));
            }
        }
        self.state_machine.process(ConnectionInput::SendData)?;
        trace!(
            "send DATA on {:?}: {} octets, end_stream={}",
            id,
            data.len(),
            end_stream
        );
        if end_stream {
            self.streams.remove(&id);
        }
        Ok(())
    }

    /// Ends `id` with an empty DATA frame carrying END_STREAM, retiring
    /// the stream object.
    pub fn end_stream(&mut self, id: StreamId) -> Result<()> {
        self.state_machine.process(ConnectionInput::SendData)?;
        trace!("end stream {:?}", id);
        self.streams.remove(&id);
        Ok(())
    }

    /// Sends a PUSH_PROMISE reserving `promised_id` on `id`.
    ///
    /// The promised request headers are normalized and validated as a
    /// push-promise block. Legal only on the server side; the promised
    /// stream is the embedder's to register once it begins.
    pub fn push_stream(
        &mut self,
        id: StreamId,
        promised_id: StreamId,
        request_headers: Vec<HeaderField>,
    ) -> Result<Vec<HeaderField>> {
        let flags = HeaderValidationFlags {
            is_push_promise: true,
            ..HeaderValidationFlags::default()
        };
        let block = headers::validate_outbound(
            headers::normalize_outbound(request_headers, flags),
            flags,
        )?;
        self.state_machine
            .process(ConnectionInput::SendPushPromise)?;
        trace!("send PUSH_PROMISE for {:?} on {:?}", promised_id, id);
        Ok(block)
    }

    /// Sends a WINDOW_UPDATE, optionally scoped to a stream.
    ///
    /// For the connection scope (`None` or [`StreamId::ZERO`]) the
    /// guarded increment runs here and the new window is returned.
    /// Stream-scoped increments return `None`: that accounting lives
    /// with the opaque stream objects.
    pub fn increment_flow_control_window(
        &mut self,
        increment: i64,
        stream_id: Option<StreamId>,
    ) -> Result<Option<i64>> {
        self.state_machine
            .process(ConnectionInput::SendWindowUpdate)?;
        match stream_id.filter(|id| !id.is_zero()) {
            None => {
                let new_size = guard_increment_window(self.local_window, increment)?;
                trace!("connection window {} -> {}", self.local_window, new_size);
                self.local_window = new_size;
                Ok(Some(new_size))
            }
            Some(id) => {
                trace!("window increment {} for {:?}", increment, id);
                Ok(None)
            }
        }
    }

    /// Sends a PING.
    pub fn send_ping(&mut self) -> Result<()> {
        self.state_machine.process(ConnectionInput::SendPing)?;
        trace!("send PING");
        Ok(())
    }

    /// Closes the connection by sending GOAWAY, retiring every stream.
    pub fn send_goaway(&mut self) -> Result<()> {
        self.state_machine.process(ConnectionInput::SendGoaway)?;
        debug!("connection closed locally, {} streams retired", self.streams.len());
        self.streams.clear();
        Ok(())
    }

    /// Handles a frame received on the connection.
    ///
    /// The frame kind steps the state machine; header-bearing frames
    /// then have their blocks inbound-validated and returned. DATA is
    /// held to the negotiated maximum inbound frame size, and a
    /// connection-scoped WINDOW_UPDATE goes through the guarded
    /// increment.
    pub fn recv_frame(&mut self, frame: Frame) -> Result<Option<Vec<HeaderField>>> {
        let flags = self.inbound_flags();
        match frame {
            Frame::Headers {
                stream_id,
                fields,
                end_stream,
            } => {
                self.state_machine.process(ConnectionInput::RecvHeaders)?;
                let block = headers::validate_inbound(fields, flags)?;
                trace!(
                    "recv HEADERS on {:?}: {} fields, end_stream={}",
                    stream_id,
                    block.len(),
                    end_stream
                );
                Ok(Some(block))
            }
            Frame::PushPromise {
                stream_id,
                promised_id,
                fields,
            } => {
                self.state_machine
                    .process(ConnectionInput::RecvPushPromise)?;
                // A push promise carries a request block.
                let flags = HeaderValidationFlags {
                    is_client: true,
                    is_push_promise: true,
                    ..HeaderValidationFlags::default()
                };
                let block = headers::validate_inbound(fields, flags)?;
                trace!("recv PUSH_PROMISE for {:?} on {:?}", promised_id, stream_id);
                Ok(Some(block))
            }
            Frame::Data {
                stream_id,
                payload,
                end_stream,
            } => {
                self.state_machine.process(ConnectionInput::RecvData)?;
                if let Some(max) = self.max_inbound_frame_size {
                    if payload.len() > max {
                        debug!(
                            "peer sent {} octet DATA frame, maximum is {}",
                            payload.len(),
                            max
                        );
                        return Err(Error::new_protocol(Protocol::FrameTooLarge));
                    }
                }
                trace!(
                    "recv DATA on {:?}: {} octets, end_stream={}",
                    stream_id,
                    payload.len(),
                    end_stream
                );
                Ok(None)
            }
            Frame::Goaway {
                last_stream_id,
                debug_data,
            } => {
                self.state_machine.process(ConnectionInput::RecvGoaway)?;
                debug!(
                    "peer sent GOAWAY, last stream {:?}, {} streams retired",
                    last_stream_id,
                    self.streams.len()
                );
                if !debug_data.is_empty() {
                    debug!("GOAWAY debug data: {:?}", debug_data);
                }
                self.streams.clear();
                Ok(None)
            }
            Frame::WindowUpdate {
                stream_id,
                increment,
            } => {
                self.state_machine
                    .process(ConnectionInput::RecvWindowUpdate)?;
                if stream_id.is_zero() {
                    let new_size =
                        guard_increment_window(self.remote_window, i64::from(increment))?;
                    trace!("peer window {} -> {}", self.remote_window, new_size);
                    self.remote_window = new_size;
                } else {
                    trace!("window increment {} for {:?}", increment, stream_id);
                }
                Ok(None)
            }
            Frame::Ping { .. } => {
                self.state_machine.process(ConnectionInput::RecvPing)?;
                trace!("recv PING");
                Ok(None)
            }
        }
    }

    // Sending from idle makes this side the client, so the block is
    // request-shaped; the server sends response-shaped blocks.
    fn outbound_flags(&self) -> HeaderValidationFlags {
        match self.state() {
            ConnectionState::ServerOpen => HeaderValidationFlags {
                is_response_header: true,
                ..HeaderValidationFlags::default()
            },
            _ => HeaderValidationFlags {
                is_client: true,
                ..HeaderValidationFlags::default()
            },
        }
    }

    // Receiving headers as the client means a response block.
    fn inbound_flags(&self) -> HeaderValidationFlags {
        match self.state() {
            ConnectionState::ClientOpen => HeaderValidationFlags {
                is_client: true,
                is_response_header: true,
                ..HeaderValidationFlags::default()
            },
            _ => HeaderValidationFlags::default(),
        }
    }
}

impl<S> Default for Connection<S> {
    fn default() -> Connection<S> {
        Connection::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionInput::*;
    use super::ConnectionState::*;
    use super::*;

    const ALL_INPUTS: [ConnectionInput; 12] = [
        SendHeaders,
        SendPushPromise,
        SendData,
        SendGoaway,
        SendWindowUpdate,
        SendPing,
        RecvHeaders,
        RecvPushPromise,
        RecvData,
        RecvGoaway,
        RecvWindowUpdate,
        RecvPing,
    ];

    // The full transition table, as the protocol defines it.
    const LEGAL: [(ConnectionState, ConnectionInput, ConnectionState); 24] = [
        (Idle, SendHeaders, ClientOpen),
        (Idle, RecvHeaders, ServerOpen),
        (ClientOpen, SendHeaders, ClientOpen),
        (ClientOpen, SendData, ClientOpen),
        (ClientOpen, SendGoaway, Closed),
        (ClientOpen, SendWindowUpdate, ClientOpen),
        (ClientOpen, SendPing, ClientOpen),
        (ClientOpen, RecvHeaders, ClientOpen),
        (ClientOpen, RecvPushPromise, ClientOpen),
        (ClientOpen, RecvData, ClientOpen),
        (ClientOpen, RecvGoaway, Closed),
        (ClientOpen, RecvWindowUpdate, ClientOpen),
        (ClientOpen, RecvPing, ClientOpen),
        (ServerOpen, SendHeaders, ServerOpen),
        (ServerOpen, SendPushPromise, ServerOpen),
        (ServerOpen, SendData, ServerOpen),
        (ServerOpen, SendGoaway, Closed),
        (ServerOpen, SendWindowUpdate, ServerOpen),
        (ServerOpen, SendPing, ServerOpen),
        (ServerOpen, RecvHeaders, ServerOpen),
        (ServerOpen, RecvData, ServerOpen),
        (ServerOpen, RecvGoaway, Closed),
        (ServerOpen, RecvWindowUpdate, ServerOpen),
        (ServerOpen, RecvPing, ServerOpen),
    ];

    fn machine_in(state: ConnectionState) -> StateMachine {
        let mut machine = StateMachine::new();
        match state {
            Idle => {}
            ClientOpen => machine.process(SendHeaders).unwrap(),
            ServerOpen => machine.process(RecvHeaders).unwrap(),
            Closed => {
                machine.process(SendHeaders).unwrap();
                machine.process(SendGoaway).unwrap();
            }
        }
        assert_eq!(machine.state(), state);
        machine
    }

    #[test]
    fn every_legal_transition() {
        for &(state, input, next) in LEGAL.iter() {
            let mut machine = machine_in(state);
            machine.process(input).unwrap();
            assert_eq!(machine.state(), next, "{:?} --{:?}-->", state, input);
        }
    }

    #[test]
    fn every_illegal_input_closes() {
        for &state in &[Idle, ClientOpen, ServerOpen, Closed] {
            for &input in ALL_INPUTS.iter() {
                if LEGAL.iter().any(|&(s, i, _)| s == state && i == input) {
                    continue;
                }
                let mut machine = machine_in(state);
                let err = machine.process(input).unwrap_err();
                assert!(err.is_protocol(), "{:?} in {:?}", input, state);
                assert_eq!(machine.state(), Closed);
            }
        }
    }

    #[test]
    fn closed_is_terminal() {
        let mut machine = machine_in(Closed);
        for &input in ALL_INPUTS.iter() {
            machine.process(input).unwrap_err();
            assert_eq!(machine.state(), Closed);
        }
    }

    #[test]
    fn identical_input_sequences_are_deterministic() {
        let sequence = [SendHeaders, RecvHeaders, SendData, RecvPing, SendGoaway];
        let run = || {
            let mut machine = StateMachine::new();
            for &input in sequence.iter() {
                machine.process(input).unwrap();
            }
            machine.state()
        };
        assert_eq!(run(), run());
        assert_eq!(run(), Closed);
    }

    #[test]
    fn server_open_accepts_recv_ping() {
        let mut machine = machine_in(ServerOpen);
        machine.process(RecvPing).unwrap();
        assert_eq!(machine.state(), ServerOpen);
    }

    fn request_block() -> Vec<HeaderField> {
        vec![
            HeaderField::from((":method", "GET")),
            HeaderField::from((":scheme", "https")),
            HeaderField::from((":authority", "example.com")),
            HeaderField::from((":path", "/")),
        ]
    }

    #[test]
    fn send_headers_opens_client_side() {
        let mut conn: Connection<()> = Connection::new();
        let block = conn
            .send_headers(StreamId::new(1), request_block(), false)
            .unwrap();
        assert_eq!(block.len(), 4);
        assert_eq!(conn.state(), ClientOpen);
    }

    #[test]
    fn rejected_block_leaves_state_untouched() {
        let mut conn: Connection<()> = Connection::new();
        let block = vec![
            HeaderField::from((":method", "GET")),
            HeaderField::from(("x", "1")),
            HeaderField::from((":path", "/")),
        ];
        let err = conn.send_headers(StreamId::new(1), block, false).unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(conn.state(), Idle);
    }

    #[test]
    fn send_headers_normalizes_the_block() {
        let mut conn: Connection<()> = Connection::new();
        let mut block = request_block();
        block.push(HeaderField::text("Authorization", "Basic dXNlcjpwYXNz"));
        let block = conn.send_headers(StreamId::new(1), block, false).unwrap();
        let auth = block.last().unwrap();
        assert_eq!(auth.name(), b"authorization");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn client_may_not_push() {
        let mut conn: Connection<()> = Connection::new();
        conn.send_headers(StreamId::new(1), request_block(), false)
            .unwrap();
        let err = conn
            .push_stream(StreamId::new(1), StreamId::new(2), request_block())
            .unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(conn.state(), Closed);
    }

    #[test]
    fn server_may_push() {
        let mut conn: Connection<()> = Connection::new();
        conn.recv_frame(Frame::Headers {
            stream_id: StreamId::new(1),
            fields: request_block(),
            end_stream: false,
        })
        .unwrap();
        conn.push_stream(StreamId::new(1), StreamId::new(2), request_block())
            .unwrap();
        assert_eq!(conn.state(), ServerOpen);
    }

    #[test]
    fn illegal_send_closes_connection() {
        let mut conn: Connection<()> = Connection::new();
        let err = conn
            .send_data(StreamId::new(1), Bytes::from_static(b"hi"), false)
            .unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(conn.state(), Closed);
    }

    #[test]
    fn oversized_data_frames_are_refused() {
        let mut conn: Connection<()> = Connection::new();
        conn.send_headers(StreamId::new(1), request_block(), false)
            .unwrap();
        conn.set_max_outbound_frame_size(Some(4));
        let err = conn
            .send_data(StreamId::new(1), Bytes::from_static(b"too big"), false)
            .unwrap_err();
        assert!(err.is_protocol());
        // The refusal happens before the state machine moves.
        assert_eq!(conn.state(), ClientOpen);
    }

    #[test]
    fn end_stream_retires_the_stream_object() {
        let mut conn: Connection<&'static str> = Connection::new();
        conn.send_headers(StreamId::new(1), request_block(), false)
            .unwrap();
        conn.begin_stream(StreamId::new(1), "stream one");
        assert_eq!(conn.stream(StreamId::new(1)), Some(&"stream one"));
        conn.end_stream(StreamId::new(1)).unwrap();
        assert_eq!(conn.stream(StreamId::new(1)), None);
    }

    #[test]
    fn connection_window_increments_are_guarded() {
        let mut conn: Connection<()> = Connection::new();
        conn.send_headers(StreamId::new(1), request_block(), false)
            .unwrap();

        let new_size = conn.increment_flow_control_window(1_000, None).unwrap();
        assert_eq!(new_size, Some(DEFAULT_INITIAL_WINDOW_SIZE + 1_000));

        let err = conn
            .increment_flow_control_window(i64::from(u32::MAX), None)
            .unwrap_err();
        assert!(err.is_flow_control());
        // A guarded overflow is not a state-machine violation.
        assert_eq!(conn.state(), ClientOpen);

        // Stream-scoped increments are the stream layer's accounting.
        let scoped = conn
            .increment_flow_control_window(10, Some(StreamId::new(1)))
            .unwrap();
        assert_eq!(scoped, None);
    }

    #[test]
    fn recv_window_update_grows_remote_window() {
        let mut conn: Connection<()> = Connection::new();
        conn.send_headers(StreamId::new(1), request_block(), false)
            .unwrap();
        conn.recv_frame(Frame::WindowUpdate {
            stream_id: StreamId::ZERO,
            increment: 100,
        })
        .unwrap();
        assert_eq!(conn.remote_window(), DEFAULT_INITIAL_WINDOW_SIZE + 100);
    }

    #[test]
    fn recv_goaway_retires_streams() {
        let mut conn: Connection<u32> = Connection::new();
        conn.send_headers(StreamId::new(1), request_block(), false)
            .unwrap();
        conn.begin_stream(StreamId::new(1), 1);
        conn.recv_frame(Frame::Goaway {
            last_stream_id: StreamId::new(1),
            debug_data: Bytes::new(),
        })
        .unwrap();
        assert_eq!(conn.state(), Closed);
        assert_eq!(conn.stream(StreamId::new(1)), None);

        let err = conn.send_ping().unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn recv_response_requires_status() {
        let mut conn: Connection<()> = Connection::new();
        conn.send_headers(StreamId::new(1), request_block(), true)
            .unwrap();
        let err = conn
            .recv_frame(Frame::Headers {
                stream_id: StreamId::new(1),
                fields: vec![HeaderField::from(("content-length", "0"))],
                end_stream: false,
            })
            .unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn recv_validated_block_is_returned() {
        let mut conn: Connection<()> = Connection::new();
        let block = conn
            .recv_frame(Frame::Headers {
                stream_id: StreamId::new(1),
                fields: request_block(),
                end_stream: false,
            })
            .unwrap();
        assert_eq!(block, Some(request_block()));
        assert_eq!(conn.state(), ServerOpen);
    }
}
