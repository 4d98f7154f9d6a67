//! Error types for looper.
//!
//! Two error domains, split the way the faults surface:
//!
//! - [`LoopError`] - lifecycle and thread-affinity faults, returned
//!   synchronously to the offending caller
//! - [`DispatchError`] - payload faults raised while delivering one event,
//!   observed by the loop thread

use std::io;
use thiserror::Error;

use crate::event_loop::LoopState;

/// Faults raised by lifecycle and registration operations.
///
/// All variants are programmer errors: the call was made in the wrong loop
/// state or from the wrong thread. They are never retried internally.
#[derive(Error, Debug)]
pub enum LoopError {
    /// An operation was invoked while the loop was in a state that forbids it.
    #[error("`{operation}` is not legal while the loop is {state}")]
    IllegalState {
        /// The public entry point that was called.
        operation: &'static str,
        /// The lifecycle state observed at the time of the call.
        state: LoopState,
    },

    /// A registry-mutating operation was invoked off the loop thread.
    #[error("`{operation}` must be called from the loop thread")]
    WrongThread {
        /// The public entry point that was called.
        operation: &'static str,
    },

    /// The OS refused to spawn the loop thread.
    #[error("failed to spawn the loop thread")]
    Spawn(#[from] io::Error),
}

/// Faults raised while delivering a single event.
///
/// A dispatch fault aborts the remaining callbacks for that one event;
/// callbacks that already fired are not rolled back and other queued events
/// are unaffected. The loop thread logs the fault and moves on.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A callback's declared payload type did not match the emitted value.
    #[error("payload for event `{event}` is not a `{expected}`")]
    PayloadType {
        /// The event whose delivery was aborted.
        event: String,
        /// The payload type the callback was registered with.
        expected: &'static str,
    },
}
