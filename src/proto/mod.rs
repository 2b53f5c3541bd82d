//! Connection-level protocol state.

pub(crate) mod connection;
pub(crate) mod flow_control;

pub use self::connection::{Connection, ConnectionInput, ConnectionState, StateMachine};
pub use self::flow_control::{guard_increment_window, MAX_WINDOW_SIZE};
