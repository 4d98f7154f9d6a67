//! Emitters: the registration and emission surface.

use std::any::Any;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use crate::callback::{Callback, ErasedFn};
use crate::error::{DispatchError, LoopError};
use crate::event::Event;
use crate::event_loop::EventLoop;
use crate::registry::Registry;

/// A named source of events, bound for life to one [`EventLoop`].
///
/// An emitter owns its callback registry. The registry is mutated only on
/// the loop thread: [`on`](Emitter::on), [`once`](Emitter::once) and
/// [`off`](Emitter::off) fail with [`LoopError::WrongThread`] anywhere else.
/// [`emit`](Emitter::emit) is the one operation callable from any thread.
///
/// `Emitter` is a cheap cloneable handle; clones share the registry and the
/// loop binding. Emitters are created through
/// [`EventLoop::emitter`](EventLoop::emitter) and need no explicit teardown.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

struct Inner {
    owner: EventLoop,
    // Only ever locked briefly: mutation, snapshot, count. Never held while
    // a callback runs, so callbacks may re-enter on/once/off freely.
    registry: Mutex<Registry>,
}

impl Emitter {
    pub(crate) fn new(owner: EventLoop) -> Self {
        Self {
            inner: Arc::new(Inner {
                owner,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// The loop this emitter is bound to.
    pub fn event_loop(&self) -> &EventLoop {
        &self.inner.owner
    }

    /// Queue `data` for delivery to every callback registered for `event`,
    /// in registration order, on the loop thread.
    ///
    /// Safe from any thread, including the loop thread itself, and never
    /// blocks on a full queue (the queue is unbounded). Fails with
    /// [`LoopError::IllegalState`] unless the loop is running.
    pub fn emit<T: Any + Send>(&self, event: &str, data: T) -> Result<(), LoopError> {
        self.inner
            .owner
            .enqueue(Event::new(self.clone(), event, Box::new(data)))
    }

    /// Append `callback` to the list for `event`.
    ///
    /// No de-duplication: the same handle registered twice fires twice.
    /// Loop thread only.
    pub fn on(&self, event: &str, callback: &Callback) -> Result<(), LoopError> {
        self.assert_loop_thread("on")?;
        tracing::trace!(event, "callback registered");
        self.inner.registry.lock().register(event, callback.clone());
        Ok(())
    }

    /// [`on`](Emitter::on) for several events at once. Loop thread only.
    pub fn on_many(&self, events: &[&str], callback: &Callback) -> Result<(), LoopError> {
        self.assert_loop_thread("on_many")?;
        let mut registry = self.inner.registry.lock();
        for &event in events {
            registry.register(event, callback.clone());
        }
        Ok(())
    }

    /// Append a one-shot registration for `event`: `callback` runs on the
    /// next delivery only.
    ///
    /// Internally `callback` is wrapped in a self-removing entry, and the
    /// returned handle is that *wrapper* - pass it to [`off`](Emitter::off)
    /// to cancel the registration before it fires. Because the wrapper and
    /// the original are distinct handles, `off(event, &callback)` with the
    /// original does not cancel a `once` registration. Loop thread only.
    pub fn once(&self, event: &str, callback: &Callback) -> Result<Callback, LoopError> {
        self.assert_loop_thread("once")?;
        let wrapper = self.once_wrapper(event, callback);
        tracing::trace!(event, "one-shot callback registered");
        self.inner.registry.lock().register(event, wrapper.clone());
        Ok(wrapper)
    }

    /// [`once`](Emitter::once) for several events at once, returning one
    /// wrapper handle per event. Each wrapper removes itself independently:
    /// firing on one event leaves the registrations on the others in place.
    /// Loop thread only.
    pub fn once_many(&self, events: &[&str], callback: &Callback) -> Result<Vec<Callback>, LoopError> {
        self.assert_loop_thread("once_many")?;
        let mut wrappers = Vec::with_capacity(events.len());
        let mut registry = self.inner.registry.lock();
        for &event in events {
            let wrapper = self.once_wrapper(event, callback);
            registry.register(event, wrapper.clone());
            wrappers.push(wrapper);
        }
        Ok(wrappers)
    }

    /// Remove the first registration of `callback` for `event`, if any.
    ///
    /// At most one occurrence is removed per call; a handle registered twice
    /// needs two calls. Removing an absent handle is a no-op. Loop thread
    /// only.
    pub fn off(&self, event: &str, callback: &Callback) -> Result<(), LoopError> {
        self.assert_loop_thread("off")?;
        self.inner.registry.lock().unregister(event, callback);
        Ok(())
    }

    /// Number of callbacks currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.registry.lock().len(event)
    }

    /// Deliver `payload` to every callback registered for `event`, in order.
    ///
    /// Driven by the loop's dispatch cycle, on the loop thread. Iterates a
    /// snapshot of the list so callbacks may mutate the registry mid-flight.
    /// The first payload mismatch aborts the remaining callbacks for this
    /// event; callbacks that already fired stand.
    pub(crate) fn dispatch(
        &self,
        event: &str,
        payload: &(dyn Any + Send),
    ) -> Result<(), DispatchError> {
        let snapshot = self.inner.registry.lock().snapshot(event);
        for callback in snapshot {
            callback
                .invoke(payload)
                .map_err(|cast| DispatchError::PayloadType {
                    event: event.to_owned(),
                    expected: cast.expected,
                })?;
        }
        Ok(())
    }

    // Build the self-removing wrapper for `once`. The wrapper must remove
    // its own handle, which only exists once the wrapper is built, so the
    // handle reaches the closure through a slot filled right after
    // construction. Both the slot and the loop binding are held weakly:
    // during an invocation the registry keeps them alive, and outside one
    // the wrapper must not keep its emitter alive.
    fn once_wrapper(&self, event: &str, callback: &Callback) -> Callback {
        let slot: Arc<OnceLock<Weak<ErasedFn>>> = Arc::new(OnceLock::new());
        let run: Arc<ErasedFn> = {
            let slot = Arc::clone(&slot);
            let inner = Arc::downgrade(&self.inner);
            let event = event.to_owned();
            let callback = callback.clone();
            Arc::new(move |payload: &(dyn Any + Send)| {
                callback.invoke(payload)?;
                let me = slot.get().and_then(Weak::upgrade).map(Callback::from_erased);
                if let (Some(inner), Some(me)) = (inner.upgrade(), me) {
                    inner.registry.lock().unregister(&event, &me);
                }
                Ok(())
            })
        };
        let wrapper = Callback::from_erased(run);
        let _ = slot.set(wrapper.downgrade());
        wrapper
    }

    fn assert_loop_thread(&self, operation: &'static str) -> Result<(), LoopError> {
        if self.inner.owner.is_loop_thread() {
            Ok(())
        } else {
            Err(LoopError::WrongThread { operation })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Dispatch itself has no affinity precondition (the loop drives it), so
    // these tests poke the registry directly and call dispatch inline.
    fn test_emitter() -> Emitter {
        Emitter::new(EventLoop::new())
    }

    fn boxed<T: Any + Send>(data: T) -> Box<dyn Any + Send> {
        Box::new(data)
    }

    #[test]
    fn dispatch_with_no_listeners_is_a_noop() {
        let emitter = test_emitter();
        emitter
            .dispatch("nobody-listens", boxed(1u8).as_ref())
            .expect("no listeners is not an error");
    }

    #[test]
    fn dispatch_invokes_in_registration_order_with_the_payload() {
        let emitter = test_emitter();
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            let cb = Callback::new(move |who: &String| log.lock().push(format!("{tag}:{who}")));
            emitter.inner.registry.lock().register("greet", cb);
        }

        emitter
            .dispatch("greet", boxed("world".to_string()).as_ref())
            .expect("matching payload");

        assert_eq!(*log.lock(), vec!["first:world", "second:world"]);
    }

    #[test]
    fn payload_mismatch_aborts_remaining_callbacks_for_that_event() {
        let emitter = test_emitter();
        let fired = Arc::new(AtomicUsize::new(0));

        let counting = |fired: &Arc<AtomicUsize>| {
            let fired = Arc::clone(fired);
            Callback::new(move |_: &i32| {
                fired.fetch_add(1, Ordering::SeqCst);
            })
        };

        {
            let mut registry = emitter.inner.registry.lock();
            registry.register("n", counting(&fired));
            registry.register("n", Callback::new(|_: &String| {}));
            registry.register("n", counting(&fired));
        }

        let err = emitter
            .dispatch("n", boxed(7i32).as_ref())
            .expect_err("second callback expects a String");

        let DispatchError::PayloadType { event, expected } = err;
        assert_eq!(event, "n");
        assert_eq!(expected, std::any::type_name::<String>());
        assert_eq!(
            fired.load(Ordering::SeqCst),
            1,
            "only the callback before the mismatch fires"
        );
    }

    #[test]
    fn later_dispatches_are_unaffected_by_an_earlier_mismatch() {
        let emitter = test_emitter();
        let fired = Arc::new(AtomicUsize::new(0));

        {
            let fired = Arc::clone(&fired);
            let mut registry = emitter.inner.registry.lock();
            registry.register("n", Callback::new(|_: &String| {}));
            registry.register(
                "m",
                Callback::new(move |_: &i32| {
                    fired.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        emitter
            .dispatch("n", boxed(7i32).as_ref())
            .expect_err("mismatch on n");
        emitter
            .dispatch("m", boxed(7i32).as_ref())
            .expect("m is a separate delivery");

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
