//! Testing utilities for looper.
//!
//! Ready-made callbacks for asserting on deliveries:
//!
//! - [`RecordingCallback`]: records every payload it receives
//! - [`CountingCallback`]: counts invocations regardless of payload type

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::callback::Callback;

// ============================================================================
// Recording Callback
// ============================================================================

/// Records every payload of type `T` delivered to it.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingCallback::<String>::new();
/// emitter.on("greet", &recorder.callback())?;
/// // ... drive the loop ...
/// assert_eq!(recorder.received(), vec!["world".to_string()]);
/// ```
pub struct RecordingCallback<T> {
    received: Arc<Mutex<Vec<T>>>,
}

impl<T: Any + Send + Clone> RecordingCallback<T> {
    /// A fresh recorder with an empty log.
    pub fn new() -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback handle that clones each delivered payload into the log.
    ///
    /// Every call returns a new handle with its own identity; hold on to one
    /// if you need to `off` it later.
    pub fn callback(&self) -> Callback {
        let received = Arc::clone(&self.received);
        Callback::new(move |data: &T| received.lock().push(data.clone()))
    }

    /// Clone of the recorded payloads, in delivery order.
    pub fn received(&self) -> Vec<T> {
        self.received.lock().clone()
    }

    /// Number of recorded deliveries.
    pub fn count(&self) -> usize {
        self.received.lock().len()
    }
}

impl<T: Any + Send + Clone> Default for RecordingCallback<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordingCallback<T> {
    fn clone(&self) -> Self {
        Self {
            received: Arc::clone(&self.received),
        }
    }
}

// ============================================================================
// Counting Callback
// ============================================================================

/// Counts invocations without looking at the payload.
pub struct CountingCallback {
    count: Arc<AtomicUsize>,
}

impl CountingCallback {
    /// A fresh counter at zero.
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A callback handle expecting payloads of type `T` that bumps the
    /// counter on each delivery.
    pub fn callback<T: Any + Send>(&self) -> Callback {
        let count = Arc::clone(&self.count);
        Callback::new(move |_: &T| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Current invocation count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Default for CountingCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CountingCallback {
    fn clone(&self) -> Self {
        Self {
            count: Arc::clone(&self.count),
        }
    }
}
