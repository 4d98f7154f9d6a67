//! # looper
//!
//! A thread-affine event loop: named events, ordered callbacks, one dispatch
//! thread.
//!
//! An [`EventLoop`] owns a dedicated OS thread that takes events off an
//! unbounded FIFO queue, one at a time, and runs every callback registered
//! for the event's name. [`Emitter`]s are the registration and emission
//! surface: any thread may [`emit`](Emitter::emit), while
//! [`on`](Emitter::on) / [`once`](Emitter::once) / [`off`](Emitter::off) are
//! confined to the loop thread. The result is a single-writer registry with
//! no locks held across callbacks, and the guarantee that no two callbacks
//! of an emitter ever run concurrently.
//!
//! # Guarantees
//!
//! - **One thread**: every callback runs on the loop thread, never
//!   concurrently with another callback of the same loop.
//! - **FIFO**: events are delivered in arrival order across all emitters of
//!   a loop; within one event, callbacks fire in registration order,
//!   duplicates included.
//! - **Verbatim payloads**: a dequeued event's payload reaches every
//!   callback unmodified. A callback registered for a different payload
//!   type raises a [`DispatchError::PayloadType`] fault that skips the rest
//!   of that one event's callbacks and nothing else.
//! - **Explicit lifecycle**: `Created -> Running -> Stopped`, one way. Calls
//!   out of sequence fail with [`LoopError::IllegalState`]; registry calls
//!   off the loop thread fail with [`LoopError::WrongThread`].
//!
//! # Example
//!
//! ```rust
//! use looper::{Callback, EventLoop};
//!
//! let event_loop = EventLoop::new();
//! event_loop
//!     .start(|lp| {
//!         // This entry hook runs on the loop thread, before the first
//!         // dispatch: the place to set up emitters and callbacks.
//!         let emitter = lp.emitter().expect("loop is running");
//!
//!         let greet = Callback::new(|who: &String| println!("Hello, {who}!"));
//!         emitter.on("greet", &greet).expect("on the loop thread");
//!
//!         let leave = {
//!             let lp = lp.clone();
//!             Callback::new(move |who: &String| {
//!                 println!("Goodbye, {who}!");
//!                 lp.quit().expect("loop is running");
//!             })
//!         };
//!         emitter.on("leave", &leave).expect("on the loop thread");
//!
//!         // emit is legal from any thread, this one included; dispatch
//!         // begins once this hook returns.
//!         emitter.emit("greet", "world".to_string()).expect("loop is running");
//!         emitter.emit("leave", "everyone".to_string()).expect("loop is running");
//!     })
//!     .expect("fresh loop");
//!
//! event_loop.join().expect("loop thread did not panic");
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod callback;
mod emitter;
mod error;
mod event;
mod event_loop;
mod registry;

pub mod testing;

pub use callback::Callback;
pub use emitter::Emitter;
pub use error::{DispatchError, LoopError};
pub use event_loop::{EventLoop, LoopState};
