//! Child wrapper resolution and caching.
//!
//! This module provides [`ChildResolver`], the per-wrapper cache that turns complex and
//! collection property values into tracked child wrappers. Resolution is lazy (a child
//! is wrapped on first read), consults the session's identity graph so reference-equal
//! targets share one wrapper, and subscribes the parent to each child's `StatusChanged`
//! notifications so a status change deep in the graph surfaces as a `PropertyChanged`
//! on the parent property leading to it.
//!
//! # Thread Safety
//!
//! The cache is a sharded concurrent map keyed by property name. Two threads racing to
//! resolve the same property both end up holding the single wrapper that won
//! registration; the loser's wrapper is dropped before anyone observes it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    tracking::{
        ChangeStatus, TrackedCollection, TrackedCollectionRc, TrackedObject, TrackedObjectRc,
    },
    Error, PropertyDescriptor, PropertyKind, Result, Value,
};

/// A resolved tracked child behind a complex or collection property.
#[derive(Clone)]
pub(crate) enum ChildWrapper {
    Object(TrackedObjectRc),
    Collection(TrackedCollectionRc),
}

/// Lazy cache from property name to tracked child wrapper.
pub(crate) struct ChildResolver {
    children: DashMap<&'static str, ChildWrapper>,
    fully_resolved: AtomicBool,
}

impl ChildResolver {
    pub(crate) fn new() -> Self {
        Self {
            children: DashMap::new(),
            fully_resolved: AtomicBool::new(false),
        }
    }

    /// Resolves the tracked wrapper behind `descriptor`, creating and caching it on
    /// first call. Returns `None` for scalar, excluded, settings-disabled, or
    /// currently-null properties.
    pub(crate) fn resolve(
        &self,
        parent: &TrackedObject,
        descriptor: &PropertyDescriptor,
    ) -> Result<Option<ChildWrapper>> {
        if !self.eligible(parent, descriptor) {
            return Ok(None);
        }
        if let Some(cached) = self.children.get(descriptor.name) {
            return Ok(Some(cached.clone()));
        }

        let value = parent.read_raw(descriptor.name)?;
        let wrapper = match self.wrap_value(parent, descriptor, &value)? {
            Some(wrapper) => wrapper,
            None => return Ok(None),
        };
        Ok(Some(self.install(parent, descriptor.name, wrapper)))
    }

    /// Re-aligns the cache after a write to `descriptor`: a null write evicts the
    /// cached child, a reference write replaces it with the wrapper for the new target.
    pub(crate) fn refresh(
        &self,
        parent: &TrackedObject,
        descriptor: &PropertyDescriptor,
        value: &Value,
    ) -> Result<()> {
        if !self.eligible(parent, descriptor) {
            return Ok(());
        }
        if value.is_null() {
            self.children.remove(descriptor.name);
            return Ok(());
        }
        if self.cache_matches(descriptor.name, value) {
            return Ok(());
        }

        let wrapper = match self.wrap_value(parent, descriptor, value)? {
            Some(wrapper) => wrapper,
            None => return Ok(()),
        };
        self.children.remove(descriptor.name);
        self.install(parent, descriptor.name, wrapper);
        Ok(())
    }

    /// Resolves every eligible child of `parent` and returns the full cached set.
    ///
    /// Recursive operations (accept, reject, edit sessions, snapshots) call this so
    /// that children never touched through the wrapper API still participate.
    pub(crate) fn resolved_children(&self, parent: &TrackedObject) -> Result<Vec<ChildWrapper>> {
        if !self.fully_resolved.load(Ordering::Acquire) {
            let descriptors = {
                let guard = parent.target.read().map_err(|_| Error::LockError)?;
                guard.properties()
            };
            for descriptor in descriptors {
                self.resolve(parent, descriptor)?;
            }
            // Latched only once every descriptor resolved, so a failed pass is
            // retried by the next walk. Concurrent passes are idempotent.
            self.fully_resolved.store(true, Ordering::Release);
        }
        Ok(self
            .children
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn eligible(&self, parent: &TrackedObject, descriptor: &PropertyDescriptor) -> bool {
        if descriptor.exclude {
            return false;
        }
        match descriptor.kind {
            PropertyKind::Scalar => false,
            PropertyKind::Complex => parent.settings.track_complex_properties,
            PropertyKind::Collection => parent.settings.track_collection_properties,
        }
    }

    /// True if the cached child already wraps the exact reference in `value`.
    fn cache_matches(&self, property: &'static str, value: &Value) -> bool {
        match self.children.get(property) {
            Some(cached) => match (cached.value(), value) {
                (ChildWrapper::Object(wrapper), Value::Object(target)) => {
                    Arc::ptr_eq(&wrapper.target, target)
                }
                (ChildWrapper::Collection(wrapper), Value::List(target)) => {
                    Arc::ptr_eq(&wrapper.target, target)
                }
                _ => false,
            },
            None => false,
        }
    }

    /// Wraps `value` through the identity graph. An already-known target returns its
    /// existing wrapper; an unknown one is registered `Unchanged`.
    fn wrap_value(
        &self,
        parent: &TrackedObject,
        descriptor: &PropertyDescriptor,
        value: &Value,
    ) -> Result<Option<ChildWrapper>> {
        match value {
            Value::Null => Ok(None),
            Value::Object(target) => {
                if target
                    .read()
                    .map_err(|_| Error::LockError)?
                    .tracking_excluded()
                {
                    return Ok(None);
                }
                let wrapper = parent.graph.resolve_object_or(target, || {
                    TrackedObject::create(
                        Arc::clone(target),
                        ChangeStatus::Unchanged,
                        parent.settings,
                        Arc::clone(&parent.graph),
                    )
                });
                Ok(Some(ChildWrapper::Object(wrapper)))
            }
            Value::List(list) => {
                let wrapper = parent.graph.resolve_collection_or(list, || {
                    TrackedCollection::create(
                        Arc::clone(list),
                        parent.settings,
                        Arc::clone(&parent.graph),
                    )
                });
                if parent.settings.wrap_items_eagerly {
                    wrapper.ensure_wrapped()?;
                }
                Ok(Some(ChildWrapper::Collection(wrapper)))
            }
            _ => Err(Error::NotSupported(format!(
                "property '{}' holds a scalar value but is declared {:?}",
                descriptor.name, descriptor.kind
            ))),
        }
    }

    /// Publishes `wrapper` into the cache and subscribes the parent to its status
    /// notifications. If another thread won the race, the winner is returned and the
    /// loser is never installed or subscribed.
    fn install(
        &self,
        parent: &TrackedObject,
        property: &'static str,
        wrapper: ChildWrapper,
    ) -> ChildWrapper {
        match self.children.entry(property) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                subscribe(parent, property, &wrapper);
                vacant.insert(wrapper.clone());
                wrapper
            }
        }
    }
}

/// Routes a child's `StatusChanged` into a `PropertyChanged` on the parent property
/// that leads to it. The parent is held weakly so subscriptions never create cycles of
/// strong references between wrappers.
fn subscribe(parent: &TrackedObject, property: &'static str, wrapper: &ChildWrapper) {
    let weak_parent: Weak<TrackedObject> = parent.self_ref.clone();
    match wrapper {
        ChildWrapper::Object(child) => {
            child.events.on_status(move |_| {
                if let Some(parent) = weak_parent.upgrade() {
                    parent.events.fire_property(property);
                }
            });
        }
        ChildWrapper::Collection(child) => {
            child.events.on_status(move |_| {
                if let Some(parent) = weak_parent.upgrade() {
                    parent.events.fire_property(property);
                }
            });
        }
    }
}
