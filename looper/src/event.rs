//! The internal event record.

use std::any::Any;

use crate::emitter::Emitter;

/// One queued `{emitter, name, payload}` record.
///
/// Created by [`Emitter::emit`](crate::Emitter::emit), FIFO-ordered in the
/// loop's queue, consumed exactly once by the loop thread, then discarded.
pub(crate) struct Event {
    pub(crate) emitter: Emitter,
    pub(crate) name: String,
    pub(crate) payload: Box<dyn Any + Send>,
}

impl Event {
    pub(crate) fn new(
        emitter: Emitter,
        name: impl Into<String>,
        payload: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            emitter,
            name: name.into(),
            payload,
        }
    }
}
