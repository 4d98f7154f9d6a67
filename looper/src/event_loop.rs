//! The loop: lifecycle state machine and dispatch driver.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::emitter::Emitter;
use crate::error::LoopError;
use crate::event::Event;

/// Lifecycle state of an [`EventLoop`].
///
/// Strictly linear: `Created` -> `Running` -> `Stopped`. `Stopped` is
/// terminal; a loop is never restarted or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed; the loop thread does not exist yet.
    Created,
    /// The loop thread is (or is about to start) dispatching events.
    Running,
    /// [`quit`](EventLoop::quit) was called; the loop thread exits after the
    /// in-flight dispatch, dropping undelivered events.
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopState::Created => "created",
            LoopState::Running => "running",
            LoopState::Stopped => "stopped",
        })
    }
}

/// A handle to one event loop: a dedicated thread that takes events off an
/// unbounded FIFO queue and runs the registered callbacks for each, one at a
/// time.
///
/// The handle is cheap to clone; clones all refer to the same loop. Any
/// thread may [`emit`](Emitter::emit) into the loop, while callback
/// registration is confined to the loop thread itself - see [`Emitter`].
///
/// # Example
///
/// ```rust
/// use looper::{Callback, EventLoop};
///
/// let event_loop = EventLoop::new();
/// event_loop
///     .start(|lp| {
///         let emitter = lp.emitter().expect("loop is running");
///
///         let greet = Callback::new(|who: &String| println!("Hello, {who}!"));
///         emitter.on("greet", &greet).expect("on the loop thread");
///
///         let leave = {
///             let lp = lp.clone();
///             Callback::new(move |_: &()| lp.quit().expect("loop is running"))
///         };
///         emitter.on("leave", &leave).expect("on the loop thread");
///
///         emitter.emit("greet", "world".to_string()).expect("loop is running");
///         emitter.emit("leave", ()).expect("loop is running");
///     })
///     .expect("fresh loop");
/// event_loop.join().expect("loop thread did not panic");
/// ```
#[derive(Clone)]
pub struct EventLoop {
    shared: Arc<Shared>,
}

struct Shared {
    name: String,
    inner: Mutex<Inner>,
    /// Wakes the loop thread when an event arrives or the state flips to
    /// `Stopped`.
    wakeup: Condvar,
    /// Identity of the loop thread, published by the thread itself before
    /// the entry hook runs. Empty until [`EventLoop::start`].
    thread_id: OnceLock<ThreadId>,
    join: Mutex<Option<JoinHandle<()>>>,
}

// State flag and queue live under one mutex: the condvar predicate needs
// both, and the flag needs a visibility guarantee between quit() and the
// cycle anyway.
struct Inner {
    state: LoopState,
    queue: VecDeque<Event>,
}

impl EventLoop {
    /// A fresh loop in the `Created` state. No thread is spawned yet.
    pub fn new() -> Self {
        Self::with_name("event-loop")
    }

    /// Like [`new`](EventLoop::new), with a custom OS thread name (visible
    /// in panic messages and debuggers).
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                inner: Mutex::new(Inner {
                    state: LoopState::Created,
                    queue: VecDeque::new(),
                }),
                wakeup: Condvar::new(),
                thread_id: OnceLock::new(),
                join: Mutex::new(None),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.shared.inner.lock().state
    }

    /// Spawn the loop thread. Legal exactly once, from `Created`.
    ///
    /// The thread runs `init` to completion first - the one place to
    /// establish the initial emitters and callbacks - and then enters the
    /// dispatch cycle. The state is `Running` from before the thread exists,
    /// so events emitted inside `init` are already accepted; they sit in the
    /// queue until the cycle begins, after `init` returns.
    pub fn start<F>(&self, init: F) -> Result<(), LoopError>
    where
        F: FnOnce(&EventLoop) + Send + 'static,
    {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != LoopState::Created {
                return Err(LoopError::IllegalState {
                    operation: "start",
                    state: inner.state,
                });
            }
            inner.state = LoopState::Running;
        }

        let handle = self.clone();
        let spawned = thread::Builder::new()
            .name(self.shared.name.clone())
            .spawn(move || {
                let _ = handle.shared.thread_id.set(thread::current().id());
                tracing::debug!(name = %handle.shared.name, "loop thread started");
                init(&handle);
                handle.dispatch_cycle();
                tracing::debug!(name = %handle.shared.name, "loop thread exiting");
            });

        match spawned {
            Ok(join) => {
                *self.shared.join.lock() = Some(join);
                Ok(())
            }
            Err(err) => {
                self.shared.inner.lock().state = LoopState::Stopped;
                Err(LoopError::Spawn(err))
            }
        }
    }

    /// Stop the loop. Legal only from `Running`; callable from any thread.
    ///
    /// The loop thread observes the stop at latest after the in-flight
    /// dispatch completes; events still queued are dropped silently. This is
    /// the only sanctioned way to end the cycle.
    pub fn quit(&self) -> Result<(), LoopError> {
        let mut inner = self.shared.inner.lock();
        if inner.state != LoopState::Running {
            return Err(LoopError::IllegalState {
                operation: "quit",
                state: inner.state,
            });
        }
        inner.state = LoopState::Stopped;
        tracing::debug!(name = %self.shared.name, dropped = inner.queue.len(), "loop stopping");
        self.shared.wakeup.notify_all();
        Ok(())
    }

    /// A fresh [`Emitter`] bound to this loop. Illegal before
    /// [`start`](EventLoop::start).
    pub fn emitter(&self) -> Result<Emitter, LoopError> {
        let state = self.shared.inner.lock().state;
        if state == LoopState::Created {
            return Err(LoopError::IllegalState {
                operation: "emitter",
                state,
            });
        }
        Ok(Emitter::new(self.clone()))
    }

    /// Whether the calling thread is the loop thread.
    ///
    /// `false` before the loop thread has started. [`Emitter`]'s mutating
    /// operations use this predicate to enforce the single-writer registry
    /// discipline.
    pub fn is_loop_thread(&self) -> bool {
        self.shared
            .thread_id
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }

    /// Block until the loop thread exits.
    ///
    /// Returns the thread's result so a panicking callback is observable to
    /// the embedder. A no-op `Ok(())` if the loop was never started or was
    /// already joined.
    pub fn join(&self) -> thread::Result<()> {
        let handle = self.shared.join.lock().take();
        match handle {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }

    /// Thread-safe hand-off from `emit` into the queue. Legal only while
    /// `Running`.
    pub(crate) fn enqueue(&self, event: Event) -> Result<(), LoopError> {
        let mut inner = self.shared.inner.lock();
        if inner.state != LoopState::Running {
            return Err(LoopError::IllegalState {
                operation: "emit",
                state: inner.state,
            });
        }
        tracing::trace!(event = %event.name, depth = inner.queue.len(), "event enqueued");
        inner.queue.push_back(event);
        self.shared.wakeup.notify_one();
        Ok(())
    }

    // Loop thread only: block for events and deliver them until stopped.
    fn dispatch_cycle(&self) {
        loop {
            let event = {
                let mut inner = self.shared.inner.lock();
                loop {
                    if inner.state == LoopState::Stopped {
                        return;
                    }
                    if let Some(event) = inner.queue.pop_front() {
                        break event;
                    }
                    // A wake with nothing to do falls through and re-checks
                    // the predicate; only the state flag stops the cycle.
                    self.shared.wakeup.wait(&mut inner);
                }
            };
            tracing::trace!(event = %event.name, "dispatching");
            if let Err(err) = event.emitter.dispatch(&event.name, event.payload.as_ref()) {
                // One fault per offending event: its remaining callbacks were
                // skipped, already-fired ones stand, later events proceed.
                tracing::error!(error = %err, "dispatch aborted");
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish()
    }
}
