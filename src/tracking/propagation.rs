//! Recursive accept and reject across the tracked graph.
//!
//! This module owns the graph walks behind `is_changed`, `accept_changes` and
//! `reject_changes`. Every walk threads a per-call [`VisitSet`] keyed by wrapper
//! identity through the recursion, so diamond references are visited once and cycles
//! terminate. A fresh set is created per top-level call and never reused.
//!
//! Rollback of a collection replays its membership history in reverse: items added
//! since the last accept are removed, and deleted items return to the live sequence at
//! the index captured when they were removed, restored in ascending index order so
//! earlier reinsertion does not shift later ones.

use std::sync::Arc;

use crate::{
    tracking::{
        collection::{self, DeletedEntry},
        resolver::ChildWrapper,
        ChangeStatus, TrackedCollection, TrackedObject,
    },
    Error, Result,
};

/// Identity set of wrappers already visited in one recursive walk.
pub(crate) struct VisitSet {
    seen: std::collections::HashSet<usize>,
}

impl VisitSet {
    pub(crate) fn new() -> Self {
        Self {
            seen: std::collections::HashSet::new(),
        }
    }

    /// Marks `wrapper` visited; false if it already was.
    pub(crate) fn enter_object(&mut self, wrapper: &TrackedObject) -> bool {
        self.seen.insert(wrapper as *const TrackedObject as usize)
    }

    /// Marks `wrapper` visited; false if it already was.
    pub(crate) fn enter_collection(&mut self, wrapper: &TrackedCollection) -> bool {
        self.seen.insert(wrapper as *const TrackedCollection as usize)
    }
}

/// True if `object` or any not-yet-visited tracked descendant carries pending
/// mutations.
pub(crate) fn object_is_changed(object: &TrackedObject, visited: &mut VisitSet) -> Result<bool> {
    if !visited.enter_object(object) {
        return Ok(false);
    }
    if object.status()? != ChangeStatus::Unchanged {
        return Ok(true);
    }
    for child in object.resolver.resolved_children(object)? {
        let changed = match child {
            ChildWrapper::Object(child) => object_is_changed(&child, visited)?,
            ChildWrapper::Collection(child) => collection_is_changed(&child, visited)?,
        };
        if changed {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True if `collection` has a non-empty deleted bucket or any live item reports
/// changed.
pub(crate) fn collection_is_changed(
    collection: &TrackedCollection,
    visited: &mut VisitSet,
) -> Result<bool> {
    if !visited.enter_collection(collection) {
        return Ok(false);
    }
    collection.ensure_wrapped()?;
    if !collection
        .deleted
        .read()
        .map_err(|_| Error::LockError)?
        .is_empty()
    {
        return Ok(true);
    }
    for item in collection.items()? {
        if object_is_changed(&item, visited)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Commits `object` and every not-yet-visited tracked descendant. Children are
/// committed before the object's own ledger.
pub(crate) fn accept_object(object: &TrackedObject, visited: &mut VisitSet) -> Result<()> {
    if !visited.enter_object(object) {
        return Ok(());
    }
    for child in object.resolver.resolved_children(object)? {
        match child {
            ChildWrapper::Object(child) => accept_object(&child, visited)?,
            ChildWrapper::Collection(child) => accept_collection(&child, visited)?,
        }
    }

    let transition = {
        let mut state = object.state.write().map_err(|_| Error::LockError)?;
        state.accept()
    };
    if let Some(transition) = transition {
        object.events.fire_status(&transition);
    }
    Ok(())
}

/// Commits `collection`: the deleted bucket is discarded for good and every live item
/// is committed in place.
pub(crate) fn accept_collection(
    collection: &TrackedCollection,
    visited: &mut VisitSet,
) -> Result<()> {
    if !visited.enter_collection(collection) {
        return Ok(());
    }
    collection.ensure_wrapped()?;
    collection
        .deleted
        .write()
        .map_err(|_| Error::LockError)?
        .clear();
    for item in collection.items()? {
        accept_object(&item, visited)?;
    }
    Ok(())
}

/// Rolls back `object` and every not-yet-visited tracked descendant: children first,
/// then every ledger entry is written back onto the underlying instance.
pub(crate) fn reject_object(object: &TrackedObject, visited: &mut VisitSet) -> Result<()> {
    if !visited.enter_object(object) {
        return Ok(());
    }
    for child in object.resolver.resolved_children(object)? {
        match child {
            ChildWrapper::Object(child) => reject_object(&child, visited)?,
            ChildWrapper::Collection(child) => reject_collection(&child, visited)?,
        }
    }

    let (entries, transition) = {
        let mut state = object.state.write().map_err(|_| Error::LockError)?;
        state.drain_for_reject()
    };
    for (property, original) in entries {
        {
            let mut target = object.target.write().map_err(|_| Error::LockError)?;
            target.set_value(property, original.clone());
        }
        let descriptor = object.descriptor(property)?;
        object.resolver.refresh(object, descriptor, &original)?;
        object.events.fire_property(property);
    }
    if let Some(transition) = transition {
        object.events.fire_status(&transition);
    }
    Ok(())
}

/// Rolls back `collection`: live items are restored, items added since the last accept
/// are removed, and deleted items are reinserted at their captured original indexes.
pub(crate) fn reject_collection(
    collection: &TrackedCollection,
    visited: &mut VisitSet,
) -> Result<()> {
    if !visited.enter_collection(collection) {
        return Ok(());
    }
    collection.ensure_wrapped()?;

    let live = collection.items()?;
    let mut added = Vec::new();
    for (index, item) in live.iter().enumerate() {
        if item.status()? == ChangeStatus::Added {
            added.push((index, Arc::clone(item)));
        } else {
            reject_object(item, visited)?;
        }
    }

    // Remove additions from the tail first so earlier live indexes stay valid; the
    // underlying element is located by identity, never by index.
    {
        let mut items = collection.items.write().map_err(|_| Error::LockError)?;
        let mut underlying = collection.target.write().map_err(|_| Error::LockError)?;
        for (index, item) in added.into_iter().rev() {
            if index < items.len() {
                items.remove(index);
            }
            if let Some(at) = collection::underlying_position(&underlying, &item.target) {
                underlying.remove(at);
            }
        }
    }

    let mut entries: Vec<DeletedEntry> = {
        let mut deleted = collection.deleted.write().map_err(|_| Error::LockError)?;
        deleted.drain(..).collect()
    };
    entries.sort_by_key(|entry| entry.original_index);

    for entry in entries {
        reject_object(&entry.item, visited)?;
        // A cycle can leave the item unvisited by the walk above; the membership
        // rollback still settles it.
        if entry.item.status()? == ChangeStatus::Deleted {
            entry.item.transition_status(ChangeStatus::Unchanged)?;
        }
        let mut items = collection.items.write().map_err(|_| Error::LockError)?;
        let mut underlying = collection.target.write().map_err(|_| Error::LockError)?;
        let index = entry.original_index.min(items.len());
        let at = collection::underlying_insert_position(&items, &underlying, index);
        items.insert(index, Arc::clone(&entry.item));
        underlying.insert(at, entry.item.target());
    }
    Ok(())
}
