//! Type-erased callbacks with pointer identity.

use std::any::{self, Any};
use std::fmt;
use std::sync::{Arc, Weak};

/// A failed payload downcast, raised when a callback's declared payload type
/// does not match the value that was emitted. Dispatch converts this into a
/// [`DispatchError::PayloadType`](crate::DispatchError::PayloadType), which
/// also carries the event name.
#[derive(Debug)]
pub(crate) struct CastError {
    pub(crate) expected: &'static str,
}

pub(crate) type ErasedFn = dyn Fn(&(dyn Any + Send)) -> Result<(), CastError> + Send + Sync;

/// A unit of work that can be registered for an event and invoked with the
/// event's payload, always on the loop thread.
///
/// A `Callback` is a cheap cloneable handle; every clone refers to the same
/// underlying closure. Identity is pointer identity: registering one value
/// twice yields two list entries that fire twice, and
/// [`Emitter::off`](crate::Emitter::off) removes the first entry whose handle
/// is identical to the one given.
///
/// # Example
///
/// ```rust
/// use looper::Callback;
///
/// let greet = Callback::new(|who: &String| println!("Hello, {who}!"));
/// assert!(Callback::ptr_eq(&greet, &greet.clone()));
/// ```
pub struct Callback {
    run: Arc<ErasedFn>,
}

impl Callback {
    /// Build a callback expecting payloads of type `T`.
    ///
    /// The declared type is checked at invocation time: a payload of any
    /// other type raises a payload-mismatch fault naming `T` instead of
    /// reaching `f`.
    pub fn new<T, F>(f: F) -> Self
    where
        T: Any + Send,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let run: Arc<ErasedFn> = Arc::new(move |payload: &(dyn Any + Send)| {
            match payload.downcast_ref::<T>() {
                Some(data) => {
                    f(data);
                    Ok(())
                }
                None => Err(CastError {
                    expected: any::type_name::<T>(),
                }),
            }
        });
        Self { run }
    }

    /// Wrap an already-erased closure. Used for the self-removing wrapper
    /// behind [`Emitter::once`](crate::Emitter::once).
    pub(crate) fn from_erased(run: Arc<ErasedFn>) -> Self {
        Self { run }
    }

    pub(crate) fn invoke(&self, payload: &(dyn Any + Send)) -> Result<(), CastError> {
        (self.run)(payload)
    }

    /// Weak view of the underlying closure, for entries that must refer to
    /// themselves without keeping themselves alive.
    pub(crate) fn downgrade(&self) -> Weak<ErasedFn> {
        Arc::downgrade(&self.run)
    }

    /// Whether two handles refer to the same registered callback.
    pub fn ptr_eq(a: &Callback, b: &Callback) -> bool {
        Arc::ptr_eq(&a.run, &b.run)
    }
}

impl Clone for Callback {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("ptr", &Arc::as_ptr(&self.run))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity_distinct_callbacks_do_not() {
        let a = Callback::new(|_: &i32| {});
        let b = Callback::new(|_: &i32| {});

        assert!(Callback::ptr_eq(&a, &a.clone()));
        assert!(!Callback::ptr_eq(&a, &b));
    }

    #[test]
    fn invoke_downcasts_the_declared_type() {
        use std::sync::Mutex;

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let cb = {
            let seen = seen.clone();
            Callback::new(move |s: &String| seen.lock().unwrap().push(s.clone()))
        };

        let payload: Box<dyn Any + Send> = Box::new("hi".to_string());
        cb.invoke(payload.as_ref()).expect("matching payload type");

        assert_eq!(*seen.lock().unwrap(), vec!["hi".to_string()]);
    }

    #[test]
    fn invoke_reports_the_expected_type_on_mismatch() {
        let cb = Callback::new(|_: &u32| {});

        let payload: Box<dyn Any + Send> = Box::new("oops".to_string());
        let err = cb.invoke(payload.as_ref()).unwrap_err();

        assert_eq!(err.expected, any::type_name::<u32>());
    }
}
