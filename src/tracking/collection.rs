//! The per-list tracking wrapper.
//!
//! This module provides [`TrackedCollection`], the engine's shadow of one underlying
//! list. The collection wrapper keeps the live sequence of tracked items, a side bucket
//! of removed-but-uncommitted items with their capture-time indexes, and mirrors every
//! structural edit onto the underlying list so the plain data stays in sync.
//!
//! # Architecture
//!
//! Per-item status lives on the item wrappers themselves; the collection's job is
//! membership bookkeeping. Removal of a non-`Added` item moves it into the deleted
//! bucket with the index it held at removal time. Re-inserting such an item reconciles
//! against the bucket: same index with a clean ledger restores `Unchanged`, anything
//! else restores `Changed`. An `Added` item that is removed again is discarded outright
//! and never enters the bucket.
//!
//! Lock order within this module is live sequence, then underlying list, then deleted
//! bucket. Status notifications are delivered only after all three are released.
//!
//! Elements whose type is excluded from tracking never enter the live sequence but stay
//! in the underlying list, so live indexes and underlying positions can diverge. All
//! mirroring therefore locates underlying elements by reference identity, never by
//! index.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock, Weak,
};

use crate::{
    tracking::{
        edit,
        events::EventRegistry,
        identity::IdentityGraphRc,
        propagation::{self, VisitSet},
        ChangeStatus, StatusTransition, TrackedObject, TrackedObjectRc, TrackingSettings,
    },
    Error, Result, TrackableListRc, TrackableRc,
};

/// Reference-counted handle to a [`TrackedCollection`].
pub type TrackedCollectionRc = Arc<TrackedCollection>;

/// A removed-but-uncommitted item together with the index it held at removal time.
pub(crate) struct DeletedEntry {
    pub(crate) item: TrackedObjectRc,
    pub(crate) original_index: usize,
}

/// Position of `target` in the underlying list, by reference identity.
pub(crate) fn underlying_position(
    underlying: &[TrackableRc],
    target: &TrackableRc,
) -> Option<usize> {
    underlying
        .iter()
        .position(|element| Arc::ptr_eq(element, target))
}

/// Underlying position for an element inserted at live `index`: directly before the
/// element currently holding that live position, or at the end when appending.
pub(crate) fn underlying_insert_position(
    items: &[TrackedObjectRc],
    underlying: &[TrackableRc],
    index: usize,
) -> usize {
    match items.get(index) {
        Some(next) => underlying_position(underlying, &next.target).unwrap_or(underlying.len()),
        None => underlying.len(),
    }
}

/// The engine's stateful shadow of one underlying list.
///
/// Obtained from [`crate::track_collection`] or from a parent wrapper's collection
/// property. Structural edits through this wrapper are mirrored onto the underlying
/// list; edits made directly to the underlying list are not observed.
pub struct TrackedCollection {
    pub(crate) target: TrackableListRc,
    pub(crate) settings: TrackingSettings,
    pub(crate) graph: IdentityGraphRc,
    pub(crate) items: RwLock<Vec<TrackedObjectRc>>,
    pub(crate) deleted: RwLock<Vec<DeletedEntry>>,
    pub(crate) events: EventRegistry,
    wrapped: AtomicBool,
    self_ref: Weak<TrackedCollection>,
}

impl TrackedCollection {
    /// Creates a collection wrapper. Item wrapping is deferred until the first
    /// operation (or until [`TrackedCollection::ensure_wrapped`] under eager settings).
    pub(crate) fn create(
        target: TrackableListRc,
        settings: TrackingSettings,
        graph: IdentityGraphRc,
    ) -> TrackedCollectionRc {
        Arc::new_cyclic(|self_ref| TrackedCollection {
            target,
            settings,
            graph,
            items: RwLock::new(Vec::new()),
            deleted: RwLock::new(Vec::new()),
            events: EventRegistry::new(),
            wrapped: AtomicBool::new(false),
            self_ref: self_ref.clone(),
        })
    }

    /// The originally-wrapped underlying list.
    #[must_use]
    pub fn target(&self) -> TrackableListRc {
        Arc::clone(&self.target)
    }

    /// Number of live items.
    pub fn len(&self) -> Result<usize> {
        self.ensure_wrapped()?;
        Ok(self.items.read().map_err(|_| Error::LockError)?.len())
    }

    /// True if the live sequence is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The tracked item at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `index` is out of bounds.
    pub fn get(&self, index: usize) -> Result<TrackedObjectRc> {
        self.ensure_wrapped()?;
        let items = self.items.read().map_err(|_| Error::LockError)?;
        items.get(index).cloned().ok_or_else(|| {
            invalid_state_error!("index {} out of bounds for collection of {}", index, items.len())
        })
    }

    /// Point-in-time copy of the live sequence.
    pub fn items(&self) -> Result<Vec<TrackedObjectRc>> {
        self.ensure_wrapped()?;
        Ok(self.items.read().map_err(|_| Error::LockError)?.clone())
    }

    /// Inserts `item` at `index`, wrapping it `Added` (or reconciling it with the
    /// deleted bucket if it was removed earlier in this session).
    ///
    /// Re-inserting a previously removed item at the index it was removed from, with no
    /// other pending mutations on it, restores it to `Unchanged`; re-inserting it
    /// anywhere else, or with a dirty ledger, restores it to `Changed`. Either way it
    /// leaves the deleted bucket.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `index` is past the end of the live sequence or the
    /// item's type is excluded from tracking.
    pub fn insert(&self, index: usize, item: TrackableRc) -> Result<TrackedObjectRc> {
        self.ensure_wrapped()?;
        if item
            .read()
            .map_err(|_| Error::LockError)?
            .tracking_excluded()
        {
            return Err(invalid_state_error!(
                "cannot insert an instance of a type excluded from tracking"
            ));
        }

        let (wrapper, pending) = {
            let mut items = self.items.write().map_err(|_| Error::LockError)?;
            if index > items.len() {
                return Err(invalid_state_error!(
                    "insert index {} out of bounds for collection of {}",
                    index,
                    items.len()
                ));
            }

            let reconciled = {
                let mut deleted = self.deleted.write().map_err(|_| Error::LockError)?;
                deleted
                    .iter()
                    .position(|entry| Arc::ptr_eq(&entry.item.target, &item))
                    .map(|position| deleted.remove(position))
            };

            let (wrapper, pending) = match reconciled {
                Some(entry) => {
                    let status = if index == entry.original_index && entry.item.ledger_is_empty()? {
                        ChangeStatus::Unchanged
                    } else {
                        ChangeStatus::Changed
                    };
                    (entry.item, Some(status))
                }
                None => {
                    let wrapper = self.adopt(&item, ChangeStatus::Added);
                    // An adopted wrapper deleted from another collection comes back as
                    // a fresh addition here.
                    let pending = match wrapper.status()? {
                        ChangeStatus::Deleted => Some(ChangeStatus::Added),
                        _ => None,
                    };
                    (wrapper, pending)
                }
            };

            self.attach(&wrapper);
            {
                let mut underlying = self.target.write().map_err(|_| Error::LockError)?;
                let at = underlying_insert_position(&items, &underlying, index);
                underlying.insert(at, item);
            }
            items.insert(index, wrapper.clone());
            (wrapper, pending)
        };

        if let Some(status) = pending {
            wrapper.transition_status(status)?;
        }
        Ok(wrapper)
    }

    /// Appends `item` to the end of the live sequence, wrapping it `Added`.
    pub fn push(&self, item: TrackableRc) -> Result<TrackedObjectRc> {
        let index = self.len()?;
        self.insert(index, item)
    }

    /// Removes the item at `index` from the live sequence.
    ///
    /// A non-`Added` item is marked `Deleted` and parked in the deleted bucket with its
    /// current index; an `Added` item is discarded entirely and never enters the
    /// bucket. Returns the removed wrapper.
    pub fn remove_at(&self, index: usize) -> Result<TrackedObjectRc> {
        self.ensure_wrapped()?;
        let (wrapper, was_added) = {
            let mut items = self.items.write().map_err(|_| Error::LockError)?;
            if index >= items.len() {
                return Err(invalid_state_error!(
                    "remove index {} out of bounds for collection of {}",
                    index,
                    items.len()
                ));
            }
            let wrapper = items.remove(index);
            {
                let mut underlying = self.target.write().map_err(|_| Error::LockError)?;
                if let Some(at) = underlying_position(&underlying, &wrapper.target) {
                    underlying.remove(at);
                }
            }
            let was_added = wrapper.status()? == ChangeStatus::Added;
            if !was_added {
                let mut deleted = self.deleted.write().map_err(|_| Error::LockError)?;
                deleted.push(DeletedEntry {
                    item: Arc::clone(&wrapper),
                    original_index: index,
                });
            }
            (wrapper, was_added)
        };

        if !was_added {
            wrapper.mark_deleted()?;
        }
        Ok(wrapper)
    }

    /// Removes the given tracked item from the live sequence. Returns false if the
    /// item is not currently live.
    pub fn remove(&self, item: &TrackedObjectRc) -> Result<bool> {
        self.ensure_wrapped()?;
        let position = {
            let items = self.items.read().map_err(|_| Error::LockError)?;
            items.iter().position(|candidate| Arc::ptr_eq(candidate, item))
        };
        match position {
            Some(index) => {
                self.remove_at(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Restores a deleted item to the end of the live sequence and resets it to
    /// `Unchanged`. Returns false if `item` is not currently in the deleted bucket.
    ///
    /// Distinct from reject: the item comes back at the end, not at its original
    /// index, and nothing else is rolled back.
    pub fn un_delete(&self, item: &TrackedObjectRc) -> Result<bool> {
        self.ensure_wrapped()?;
        let entry = {
            let mut deleted = self.deleted.write().map_err(|_| Error::LockError)?;
            deleted
                .iter()
                .position(|entry| Arc::ptr_eq(&entry.item, item))
                .map(|position| deleted.remove(position))
        };
        let entry = match entry {
            Some(entry) => entry,
            None => return Ok(false),
        };

        {
            let mut items = self.items.write().map_err(|_| Error::LockError)?;
            items.push(Arc::clone(&entry.item));
            let mut underlying = self.target.write().map_err(|_| Error::LockError)?;
            underlying.push(entry.item.target());
        }
        entry.item.transition_status(ChangeStatus::Unchanged)?;
        Ok(true)
    }

    /// Live items whose status is `Unchanged`.
    pub fn unchanged_items(&self) -> Result<Vec<TrackedObjectRc>> {
        self.partition(ChangeStatus::Unchanged)
    }

    /// Live items whose status is `Added`.
    pub fn added_items(&self) -> Result<Vec<TrackedObjectRc>> {
        self.partition(ChangeStatus::Added)
    }

    /// Live items whose status is `Changed`.
    pub fn changed_items(&self) -> Result<Vec<TrackedObjectRc>> {
        self.partition(ChangeStatus::Changed)
    }

    /// Items removed since the last accept, in removal order.
    pub fn deleted_items(&self) -> Result<Vec<TrackedObjectRc>> {
        self.ensure_wrapped()?;
        Ok(self
            .deleted
            .read()
            .map_err(|_| Error::LockError)?
            .iter()
            .map(|entry| Arc::clone(&entry.item))
            .collect())
    }

    /// True if any item carries pending mutations or the membership itself changed.
    pub fn is_changed(&self) -> Result<bool> {
        self.ensure_wrapped()?;
        propagation::collection_is_changed(self, &mut VisitSet::new())
    }

    /// Commits membership and every live item's pending mutations; the deleted bucket
    /// is emptied for good.
    pub fn accept_changes(&self) -> Result<()> {
        self.ensure_wrapped()?;
        propagation::accept_collection(self, &mut VisitSet::new())
    }

    /// Rolls back membership and every live item: deleted items return to their
    /// original indexes, items added since the last accept are removed, and item
    /// ledgers are restored.
    pub fn reject_changes(&self) -> Result<()> {
        self.ensure_wrapped()?;
        propagation::reject_collection(self, &mut VisitSet::new())
    }

    /// Opens a transactional edit session on every live item.
    pub fn begin_edit(&self) -> Result<()> {
        self.ensure_wrapped()?;
        edit::begin_collection(self, &mut VisitSet::new())
    }

    /// Discards open edit sessions across the live items, restoring pre-edit values.
    pub fn cancel_edit(&self) -> Result<()> {
        self.ensure_wrapped()?;
        edit::cancel_collection(self, &mut VisitSet::new())
    }

    /// Commits open edit sessions across the live items.
    pub fn end_edit(&self) -> Result<()> {
        self.ensure_wrapped()?;
        edit::end_collection(self, &mut VisitSet::new())
    }

    /// Registers an observer for status transitions of items in this collection.
    pub fn on_status_changed(&self, handler: impl Fn(&StatusTransition) + Send + Sync + 'static) {
        self.events.on_status(handler);
    }

    // ---- crate-internal helpers -------------------------------------------------

    /// Wraps every underlying element `Unchanged`. Idempotent; the second and later
    /// calls return immediately.
    pub(crate) fn ensure_wrapped(&self) -> Result<()> {
        if self.wrapped.load(Ordering::Acquire) {
            return Ok(());
        }
        let mut items = self.items.write().map_err(|_| Error::LockError)?;
        if self.wrapped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let targets = self.target.read().map_err(|_| Error::LockError)?.clone();
        for target in targets {
            if target
                .read()
                .map_err(|_| Error::LockError)?
                .tracking_excluded()
            {
                continue;
            }
            let wrapper = self.adopt(&target, ChangeStatus::Unchanged);
            self.attach(&wrapper);
            items.push(wrapper);
        }
        Ok(())
    }

    /// Removes an `Added` item whose edit session was cancelled before ever being
    /// committed. Returns false if the item is no longer live.
    pub(crate) fn discard(&self, item: &TrackedObject) -> Result<bool> {
        let removed = {
            let mut items = self.items.write().map_err(|_| Error::LockError)?;
            let position = items
                .iter()
                .position(|candidate| std::ptr::eq(Arc::as_ptr(candidate), item));
            match position {
                Some(index) => {
                    let wrapper = items.remove(index);
                    let mut underlying = self.target.write().map_err(|_| Error::LockError)?;
                    if let Some(at) = underlying_position(&underlying, &wrapper.target) {
                        underlying.remove(at);
                    }
                    true
                }
                None => false,
            }
        };
        Ok(removed)
    }

    /// Resolves the wrapper for `target` through the identity graph, creating one with
    /// `status` if the instance is unknown.
    fn adopt(&self, target: &TrackableRc, status: ChangeStatus) -> TrackedObjectRc {
        self.graph.resolve_object_or(target, || {
            TrackedObject::create(
                Arc::clone(target),
                status,
                self.settings,
                Arc::clone(&self.graph),
            )
        })
    }

    /// Marks this collection as the item's owner and forwards the item's status
    /// transitions into the collection's own registry. Subscribes at most once per
    /// item, so re-inserts do not stack forwarders.
    fn attach(&self, wrapper: &TrackedObjectRc) {
        if wrapper.set_owner(self.self_ref.clone()) {
            let weak = self.self_ref.clone();
            wrapper.events.on_status(move |transition| {
                if let Some(collection) = weak.upgrade() {
                    collection.events.fire_status(transition);
                }
            });
        }
    }

    fn partition(&self, status: ChangeStatus) -> Result<Vec<TrackedObjectRc>> {
        self.ensure_wrapped()?;
        let items = self.items.read().map_err(|_| Error::LockError)?;
        let mut matched = Vec::new();
        for item in items.iter() {
            if item.status()? == status {
                matched.push(Arc::clone(item));
            }
        }
        Ok(matched)
    }
}
