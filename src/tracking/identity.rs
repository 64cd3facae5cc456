//! Identity graph: one wrapper per underlying instance per tracking session.
//!
//! This module provides [`IdentityGraph`], the weak-reference registry that makes
//! wrapping idempotent: any two lookups with reference-equal targets within the same
//! graph return the same wrapper, which is what terminates recursive wrapping on
//! diamond references and cycles. A fresh graph is created per top-level tracking call.
//!
//! # Architecture
//!
//! Two concurrent maps (objects and collections) are keyed by the target's `Arc`
//! address. Entries hold weak handles to both the target (liveness probe) and the
//! wrapper (so the index never pins a wrapper alive). An operation counter triggers a
//! compaction sweep every [`COMPACT_INTERVAL`] operations, dropping entries whose
//! wrapper has been released.
//!
//! # Thread Safety
//!
//! Lookup and insert go through the sharded map's entry API: concurrent readers never
//! block on a whole-map lock, and insert-if-absent is atomic, so two threads racing to
//! wrap the same target both observe a single winning wrapper. The compaction sweep
//! holds at most one shard exclusively at a time, keeping lookups cheap while it runs.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, RwLock, Weak,
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    trackable::Trackable,
    tracking::{TrackedCollection, TrackedCollectionRc, TrackedObject, TrackedObjectRc},
    TrackableListRc, TrackableRc,
};

/// Operations between opportunistic compaction sweeps.
const COMPACT_INTERVAL: usize = 1024;

/// Shared handle to an identity graph.
pub(crate) type IdentityGraphRc = Arc<IdentityGraph>;

/// Stable identity token for a trackable instance (its allocation address).
pub(crate) fn object_key(target: &TrackableRc) -> usize {
    Arc::as_ptr(target) as *const () as usize
}

/// Stable identity token for a trackable collection.
pub(crate) fn list_key(list: &TrackableListRc) -> usize {
    Arc::as_ptr(list) as usize
}

struct ObjectEntry {
    target: Weak<RwLock<dyn Trackable>>,
    wrapper: Weak<TrackedObject>,
}

struct CollectionEntry {
    target: Weak<RwLock<Vec<TrackableRc>>>,
    wrapper: Weak<TrackedCollection>,
}

/// Weak-reference registry mapping underlying instances to their tracking wrappers.
///
/// Scoped to one root tracking call: every wrapper created for that root shares the
/// same graph, and wrapping any instance reachable from the root consults it first.
pub(crate) struct IdentityGraph {
    objects: DashMap<usize, ObjectEntry>,
    collections: DashMap<usize, CollectionEntry>,
    operations: AtomicUsize,
}

impl IdentityGraph {
    /// Creates an empty graph for a new tracking session.
    pub(crate) fn new() -> Self {
        Self {
            objects: DashMap::new(),
            collections: DashMap::new(),
            operations: AtomicUsize::new(0),
        }
    }

    /// Looks up the existing wrapper for `target`, if one is still alive.
    pub(crate) fn resolve_object(&self, target: &TrackableRc) -> Option<TrackedObjectRc> {
        self.bump();
        self.objects
            .get(&object_key(target))
            .and_then(|entry| entry.wrapper.upgrade())
    }

    /// Looks up the existing wrapper for `list`, if one is still alive.
    pub(crate) fn resolve_collection(&self, list: &TrackableListRc) -> Option<TrackedCollectionRc> {
        self.bump();
        self.collections
            .get(&list_key(list))
            .and_then(|entry| entry.wrapper.upgrade())
    }

    /// Returns the wrapper registered for `target`, creating and registering one via
    /// `make` if none exists.
    ///
    /// Lookup and registration are atomic with respect to other callers: two threads
    /// racing here for the same target both receive the same wrapper instance.
    pub(crate) fn resolve_object_or(
        &self,
        target: &TrackableRc,
        make: impl FnOnce() -> TrackedObjectRc,
    ) -> TrackedObjectRc {
        self.bump();
        match self.objects.entry(object_key(target)) {
            Entry::Occupied(mut occupied) => {
                if let Some(existing) = occupied.get().wrapper.upgrade() {
                    existing
                } else {
                    let wrapper = make();
                    occupied.insert(ObjectEntry {
                        target: Arc::downgrade(target),
                        wrapper: Arc::downgrade(&wrapper),
                    });
                    wrapper
                }
            }
            Entry::Vacant(vacant) => {
                let wrapper = make();
                vacant.insert(ObjectEntry {
                    target: Arc::downgrade(target),
                    wrapper: Arc::downgrade(&wrapper),
                });
                wrapper
            }
        }
    }

    /// Returns the collection wrapper registered for `list`, creating and registering
    /// one via `make` if none exists.
    pub(crate) fn resolve_collection_or(
        &self,
        list: &TrackableListRc,
        make: impl FnOnce() -> TrackedCollectionRc,
    ) -> TrackedCollectionRc {
        self.bump();
        match self.collections.entry(list_key(list)) {
            Entry::Occupied(mut occupied) => {
                if let Some(existing) = occupied.get().wrapper.upgrade() {
                    existing
                } else {
                    let wrapper = make();
                    occupied.insert(CollectionEntry {
                        target: Arc::downgrade(list),
                        wrapper: Arc::downgrade(&wrapper),
                    });
                    wrapper
                }
            }
            Entry::Vacant(vacant) => {
                let wrapper = make();
                vacant.insert(CollectionEntry {
                    target: Arc::downgrade(list),
                    wrapper: Arc::downgrade(&wrapper),
                });
                wrapper
            }
        }
    }

    fn bump(&self) {
        let count = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
        if count % COMPACT_INTERVAL == 0 {
            self.compact();
        }
    }

    /// Drops entries whose target or wrapper has been released. Live mappings (both
    /// handles still upgradeable) are always kept.
    fn compact(&self) {
        self.objects
            .retain(|_, entry| entry.target.strong_count() > 0 && entry.wrapper.strong_count() > 0);
        self.collections
            .retain(|_, entry| entry.target.strong_count() > 0 && entry.wrapper.strong_count() > 0);
    }

    #[cfg(test)]
    pub(crate) fn object_count(&self) -> usize {
        self.objects.len()
    }
}
