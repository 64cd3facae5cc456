//! Synchronous change notifications.
//!
//! This module provides [`EventRegistry`], the observer-list abstraction behind the
//! `StatusChanged` and `PropertyChanged` notifications every wrapper exposes. Handler
//! lists are append-only concurrent vectors; delivery is synchronous on the caller's
//! thread and guarded against re-entrant redelivery, so bidirectionally-subscribed
//! parent/child wrappers cannot notify each other into an infinite loop.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::tracking::StatusTransition;

/// Reserved guard slot for `StatusChanged` delivery. The NUL prefix keeps it from
/// colliding with any real property name.
const STATUS_SLOT: &str = "\u{0}status";

type StatusHandler = Box<dyn Fn(&StatusTransition) + Send + Sync>;
type PropertyHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Append-only observer registry with a per-property re-entrancy guard.
///
/// A notification for a given property is not redelivered while its delivery for the
/// same registry is already on the call stack; the nested attempt is silently dropped.
pub(crate) struct EventRegistry {
    status_handlers: boxcar::Vec<StatusHandler>,
    property_handlers: boxcar::Vec<PropertyHandler>,
    firing: Mutex<HashSet<&'static str>>,
}

impl EventRegistry {
    pub(crate) fn new() -> Self {
        Self {
            status_handlers: boxcar::Vec::new(),
            property_handlers: boxcar::Vec::new(),
            firing: Mutex::new(HashSet::new()),
        }
    }

    /// Registers a `StatusChanged` observer. Observers cannot be removed; they live as
    /// long as the wrapper.
    pub(crate) fn on_status(&self, handler: impl Fn(&StatusTransition) + Send + Sync + 'static) {
        self.status_handlers.push(Box::new(handler));
    }

    /// Registers a `PropertyChanged` observer.
    pub(crate) fn on_property(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        self.property_handlers.push(Box::new(handler));
    }

    /// Delivers a `StatusChanged` notification to all observers.
    pub(crate) fn fire_status(&self, transition: &StatusTransition) {
        if !self.enter(STATUS_SLOT) {
            return;
        }
        for (_, handler) in self.status_handlers.iter() {
            handler(transition);
        }
        self.leave(STATUS_SLOT);
    }

    /// Delivers a `PropertyChanged` notification for `property` to all observers.
    pub(crate) fn fire_property(&self, property: &'static str) {
        if !self.enter(property) {
            return;
        }
        for (_, handler) in self.property_handlers.iter() {
            handler(property);
        }
        self.leave(property);
    }

    fn enter(&self, slot: &'static str) -> bool {
        match self.firing.lock() {
            Ok(mut guard) => guard.insert(slot),
            // A poisoned guard means a handler panicked mid-delivery; notification is
            // best-effort, so skip rather than propagate.
            Err(_) => false,
        }
    }

    fn leave(&self, slot: &'static str) {
        if let Ok(mut guard) = self.firing.lock() {
            guard.remove(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::ChangeStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn property_handlers_receive_name() {
        let registry = EventRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.on_property(move |name| sink.lock().unwrap().push(name.to_string()));

        registry.fire_property("Customer");
        registry.fire_property("Id");
        assert_eq!(*seen.lock().unwrap(), vec!["Customer", "Id"]);
    }

    #[test]
    fn status_handlers_receive_transition() {
        let registry = EventRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        registry.on_status(move |transition| {
            assert_eq!(transition.from, ChangeStatus::Unchanged);
            assert_eq!(transition.to, ChangeStatus::Changed);
            sink.fetch_add(1, Ordering::SeqCst);
        });

        registry.fire_status(&StatusTransition::new(
            ChangeStatus::Unchanged,
            ChangeStatus::Changed,
        ));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_delivery_for_same_property_is_dropped() {
        let registry = Arc::new(EventRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&registry);
        let sink = Arc::clone(&count);
        registry.on_property(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
            // A handler firing the same property again must not recurse forever.
            inner.fire_property("Customer");
        });

        registry.fire_property("Customer");
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // After delivery completes, the guard is released and a fresh fire works.
        registry.fire_property("Customer");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn distinct_properties_do_not_block_each_other() {
        let registry = Arc::new(EventRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&registry);
        let sink = Arc::clone(&count);
        registry.on_property(move |name| {
            sink.fetch_add(1, Ordering::SeqCst);
            if name == "Customer" {
                inner.fire_property("Id");
            }
        });

        registry.fire_property("Customer");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
