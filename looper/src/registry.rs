//! Per-emitter callback registry.

use std::collections::HashMap;

use crate::callback::Callback;

/// Ordered event-name to callback-list mapping.
///
/// The registry itself is a plain single-threaded structure. The owning
/// [`Emitter`](crate::Emitter) guards it with a mutex (which only provides
/// `Sync` and cross-thread visibility) and asserts loop-thread affinity
/// before every mutation; that discipline, not the lock, is what makes
/// concurrent access impossible.
#[derive(Default)]
pub(crate) struct Registry {
    // Lists are created lazily on first registration and dropped when the
    // last entry is removed.
    callbacks: HashMap<String, Vec<Callback>>,
}

impl Registry {
    /// Append `callback` to the list for `event`. No de-duplication: the
    /// same handle registered twice fires twice.
    pub(crate) fn register(&mut self, event: &str, callback: Callback) {
        self.callbacks
            .entry(event.to_owned())
            .or_default()
            .push(callback);
    }

    /// Remove the first entry pointer-identical to `callback`, at most one.
    /// No-op when absent.
    pub(crate) fn unregister(&mut self, event: &str, callback: &Callback) {
        let Some(list) = self.callbacks.get_mut(event) else {
            return;
        };
        if let Some(pos) = list.iter().position(|cb| Callback::ptr_eq(cb, callback)) {
            list.remove(pos);
        }
        if list.is_empty() {
            self.callbacks.remove(event);
        }
    }

    /// Clone of the current list for `event` (cheap: Arc bumps), empty for
    /// unknown names.
    ///
    /// Dispatch iterates the snapshot with the registry lock released, so a
    /// callback may remove itself (or any other entry) from the very list it
    /// is being delivered from.
    pub(crate) fn snapshot(&self, event: &str) -> Vec<Callback> {
        self.callbacks.get(event).cloned().unwrap_or_default()
    }

    pub(crate) fn len(&self, event: &str) -> usize {
        self.callbacks.get(event).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Callback {
        Callback::new(|_: &()| {})
    }

    #[test]
    fn registration_order_is_preserved_including_duplicates() {
        let mut registry = Registry::default();
        let a = noop();
        let b = noop();

        registry.register("e", a.clone());
        registry.register("e", b.clone());
        registry.register("e", a.clone());

        let snapshot = registry.snapshot("e");
        assert_eq!(snapshot.len(), 3);
        assert!(Callback::ptr_eq(&snapshot[0], &a));
        assert!(Callback::ptr_eq(&snapshot[1], &b));
        assert!(Callback::ptr_eq(&snapshot[2], &a));
    }

    #[test]
    fn unregister_removes_only_the_first_occurrence() {
        let mut registry = Registry::default();
        let a = noop();
        let b = noop();

        registry.register("e", a.clone());
        registry.register("e", b.clone());
        registry.register("e", a.clone());

        registry.unregister("e", &a);
        let snapshot = registry.snapshot("e");
        assert_eq!(snapshot.len(), 2);
        assert!(Callback::ptr_eq(&snapshot[0], &b), "front occurrence goes first");
        assert!(Callback::ptr_eq(&snapshot[1], &a));

        registry.unregister("e", &a);
        let snapshot = registry.snapshot("e");
        assert_eq!(snapshot.len(), 1);
        assert!(Callback::ptr_eq(&snapshot[0], &b));
    }

    #[test]
    fn unregister_absent_is_a_noop() {
        let mut registry = Registry::default();
        let a = noop();

        registry.unregister("e", &a);
        assert_eq!(registry.len("e"), 0);

        registry.register("e", a.clone());
        registry.unregister("e", &noop());
        assert_eq!(registry.len("e"), 1);
    }

    #[test]
    fn list_is_dropped_when_it_empties() {
        let mut registry = Registry::default();
        let a = noop();

        registry.register("e", a.clone());
        registry.unregister("e", &a);

        assert!(registry.callbacks.is_empty());
        assert!(registry.snapshot("e").is_empty());
    }

    #[test]
    fn snapshot_of_unknown_event_is_empty() {
        let registry = Registry::default();
        assert!(registry.snapshot("nope").is_empty());
    }
}
