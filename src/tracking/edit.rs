//! Transactional edit sessions.
//!
//! This module provides [`EditSession`] and the recursive `begin_edit` /
//! `cancel_edit` / `end_edit` walks. A session mirrors the change ledger but lives
//! independently of it: it captures the pre-edit value of every property touched while
//! the session is open, so cancel can restore exactly the writes made since
//! `begin_edit` without disturbing older, already-tracked mutations.
//!
//! Cancel restores run through the normal write pipeline with the session already
//! closed, so the change ledger reconciles on its own: a restore back to the tracked
//! original removes the ledger entry, a restore to some mid-session value keeps it.
//!
//! A newly added collection item whose first session is cancelled without ever being
//! committed is removed from its owning collection (new-item-add-then-cancel).

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::{
    tracking::{
        propagation::VisitSet, resolver::ChildWrapper, ChangeStatus, TrackedCollection,
        TrackedObject,
    },
    Error, Result, Value,
};

/// Pre-edit values for one open (or closed) edit session.
pub(crate) struct EditSession {
    editing: bool,
    before_edit: HashMap<&'static str, Value>,
    ever_ended: bool,
}

impl EditSession {
    pub(crate) fn new() -> Self {
        Self {
            editing: false,
            before_edit: HashMap::new(),
            ever_ended: false,
        }
    }

    /// Captures the pre-write value on first touch of `property` while a session is
    /// open; a write returning to the captured value removes the entry again.
    pub(crate) fn record_write(&mut self, property: &'static str, old: &Value, new: &Value) {
        if !self.editing {
            return;
        }
        match self.before_edit.entry(property) {
            Entry::Occupied(entry) => {
                if new == entry.get() {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(old.clone());
            }
        }
    }
}

/// Opens a session on `object` and every not-yet-visited tracked descendant. An
/// already-open session stays open untouched.
pub(crate) fn begin_object(object: &TrackedObject, visited: &mut VisitSet) -> Result<()> {
    if !visited.enter_object(object) {
        return Ok(());
    }
    for child in object.resolver.resolved_children(object)? {
        match child {
            ChildWrapper::Object(child) => begin_object(&child, visited)?,
            ChildWrapper::Collection(child) => begin_collection(&child, visited)?,
        }
    }
    let mut session = object.edit.lock().map_err(|_| Error::LockError)?;
    if !session.editing {
        session.editing = true;
        session.before_edit.clear();
    }
    Ok(())
}

/// Opens sessions across a collection's live items. The collection itself carries no
/// session state; membership rollback on cancel is driven per item.
pub(crate) fn begin_collection(
    collection: &TrackedCollection,
    visited: &mut VisitSet,
) -> Result<()> {
    if !visited.enter_collection(collection) {
        return Ok(());
    }
    collection.ensure_wrapped()?;
    for item in collection.items()? {
        begin_object(&item, visited)?;
    }
    Ok(())
}

/// Discards the open session on `object` and every descendant, restoring captured
/// pre-edit values. Without an open session this is a no-op.
pub(crate) fn cancel_object(object: &TrackedObject, visited: &mut VisitSet) -> Result<()> {
    if !visited.enter_object(object) {
        return Ok(());
    }
    for child in object.resolver.resolved_children(object)? {
        match child {
            ChildWrapper::Object(child) => cancel_object(&child, visited)?,
            ChildWrapper::Collection(child) => cancel_collection(&child, visited)?,
        }
    }

    let (restores, never_committed) = {
        let mut session = object.edit.lock().map_err(|_| Error::LockError)?;
        if !session.editing {
            return Ok(());
        }
        session.editing = false;
        let restores: Vec<_> = session.before_edit.drain().collect();
        (restores, !session.ever_ended)
    };

    // The session is closed, so these writes are not recaptured; the change ledger
    // reconciles each restore on its own.
    for (property, value) in restores {
        object.set(property, value)?;
    }

    if never_committed && object.status()? == ChangeStatus::Added {
        if let Some(owner) = object.owner() {
            owner.discard(object)?;
        }
    }
    Ok(())
}

/// Cancels sessions across a collection's live items.
pub(crate) fn cancel_collection(
    collection: &TrackedCollection,
    visited: &mut VisitSet,
) -> Result<()> {
    if !visited.enter_collection(collection) {
        return Ok(());
    }
    collection.ensure_wrapped()?;
    for item in collection.items()? {
        cancel_object(&item, visited)?;
    }
    Ok(())
}

/// Commits the open session on `object` and every descendant, keeping the
/// in-progress values. Without an open session this is a no-op.
pub(crate) fn end_object(object: &TrackedObject, visited: &mut VisitSet) -> Result<()> {
    if !visited.enter_object(object) {
        return Ok(());
    }
    for child in object.resolver.resolved_children(object)? {
        match child {
            ChildWrapper::Object(child) => end_object(&child, visited)?,
            ChildWrapper::Collection(child) => end_collection(&child, visited)?,
        }
    }
    let mut session = object.edit.lock().map_err(|_| Error::LockError)?;
    if session.editing {
        session.before_edit.clear();
        session.editing = false;
        session.ever_ended = true;
    }
    Ok(())
}

/// Commits sessions across a collection's live items.
pub(crate) fn end_collection(
    collection: &TrackedCollection,
    visited: &mut VisitSet,
) -> Result<()> {
    if !visited.enter_collection(collection) {
        return Ok(());
    }
    collection.ensure_wrapped()?;
    for item in collection.items()? {
        end_object(&item, visited)?;
    }
    Ok(())
}
