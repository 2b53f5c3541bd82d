//! Flow-control window arithmetic.

use tracing::debug;

use crate::error::Error;
use crate::Result;

/// The largest value a flow-control window may take, 2^31 - 1.
pub const MAX_WINDOW_SIZE: i64 = (1 << 31) - 1;

/// The window size both peers start with, RFC 7540 §6.9.2.
pub(crate) const DEFAULT_INITIAL_WINDOW_SIZE: i64 = 65_535;

/// Increments a flow-control window, guarding against the window
/// growing past [`MAX_WINDOW_SIZE`].
///
/// Returns the new window value. Negative increments are accepted and
/// no lower bound is enforced; protocol rules on window shrinkage (for
/// example after a SETTINGS change) are the caller's to apply.
pub fn guard_increment_window(current: i64, increment: i64) -> Result<i64> {
    match current.checked_add(increment) {
        Some(new_size) if new_size <= MAX_WINDOW_SIZE => Ok(new_size),
        _ => {
            debug!(
                "window increment {} on {} overflows the {} octet maximum",
                increment, current, MAX_WINDOW_SIZE
            );
            Err(Error::new_flow_control())
        }
    }
}
