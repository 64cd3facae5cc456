//! Plain, unwrapped copies of a tracked graph.
//!
//! This module materializes `original()` and `current()` snapshots: deep copies of the
//! underlying data built from fresh instances with no tracking behavior attached. An
//! `Original` snapshot reads every property through the ledger (pre-mutation value if
//! recorded, live value otherwise) and reconstructs collection membership as it stood
//! before uncommitted structural edits; a `Current` snapshot copies the live values and
//! the live membership.
//!
//! Copies are built against a per-call visited map keyed by source identity, so shared
//! references come out shared and cyclic graphs come out cyclic rather than infinite.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{
    tracking::{
        identity::{self, IdentityGraphRc},
        ChangeStatus, TrackedCollection, TrackedObject,
    },
    Error, Result, TrackableListRc, TrackableRc, Value,
};

/// Which side of the ledger a snapshot reads.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotKind {
    /// Pre-mutation values and pre-edit collection membership.
    Original,
    /// Live values and live membership.
    Current,
}

/// Per-call visited state: source identity to its already-built copy.
pub(crate) struct SnapshotContext {
    graph: IdentityGraphRc,
    objects: HashMap<usize, TrackableRc>,
    lists: HashMap<usize, TrackableListRc>,
}

impl SnapshotContext {
    pub(crate) fn new(graph: IdentityGraphRc) -> Self {
        Self {
            graph,
            objects: HashMap::new(),
            lists: HashMap::new(),
        }
    }
}

/// Builds a plain copy of `object`'s underlying instance.
pub(crate) fn snapshot_object(
    object: &TrackedObject,
    kind: SnapshotKind,
    context: &mut SnapshotContext,
) -> Result<TrackableRc> {
    let key = identity::object_key(&object.target);
    if let Some(existing) = context.objects.get(&key) {
        return Ok(Arc::clone(existing));
    }

    let copy = {
        let guard = object.target.read().map_err(|_| Error::LockError)?;
        guard.new_default()
    };
    // Registered before property fill so a cycle back to this object finds the copy.
    context.objects.insert(key, Arc::clone(&copy));

    // Resolving children first puts every tracked descendant into the identity graph,
    // so reference values below can be routed through their wrappers.
    object.resolver.resolved_children(object)?;

    let descriptors = {
        let guard = object.target.read().map_err(|_| Error::LockError)?;
        guard.properties()
    };
    for descriptor in descriptors {
        let value = match kind {
            SnapshotKind::Original => object.original_value(descriptor.name)?,
            SnapshotKind::Current => object.read_raw(descriptor.name)?,
        };
        let value = snapshot_value(&value, kind, context)?;
        let mut guard = copy.write().map_err(|_| Error::LockError)?;
        guard.set_value(descriptor.name, value);
    }
    Ok(copy)
}

/// Copies one value, routing references through their wrappers when tracked.
fn snapshot_value(
    value: &Value,
    kind: SnapshotKind,
    context: &mut SnapshotContext,
) -> Result<Value> {
    match value {
        Value::Object(target) => match context.graph.resolve_object(target) {
            Some(wrapper) => Ok(Value::Object(snapshot_object(&wrapper, kind, context)?)),
            None => Ok(Value::Object(snapshot_plain(target, kind, context)?)),
        },
        Value::List(list) => match context.graph.resolve_collection(list) {
            Some(wrapper) => Ok(Value::List(snapshot_collection(&wrapper, kind, context)?)),
            None => Ok(Value::List(snapshot_plain_list(list, kind, context)?)),
        },
        other => Ok(other.clone()),
    }
}

/// Builds a plain copy of a tracked collection.
///
/// An `Original` snapshot reconstructs the membership: items added since the last
/// accept are left out, and deleted items are re-interleaved at their captured
/// indexes.
fn snapshot_collection(
    collection: &TrackedCollection,
    kind: SnapshotKind,
    context: &mut SnapshotContext,
) -> Result<TrackableListRc> {
    let key = identity::list_key(&collection.target);
    if let Some(existing) = context.lists.get(&key) {
        return Ok(Arc::clone(existing));
    }
    collection.ensure_wrapped()?;

    let copy: TrackableListRc = Arc::new(RwLock::new(Vec::new()));
    context.lists.insert(key, Arc::clone(&copy));

    let members = match kind {
        SnapshotKind::Current => collection.items()?,
        SnapshotKind::Original => {
            let mut members = Vec::new();
            for item in collection.items()? {
                if item.status()? != ChangeStatus::Added {
                    members.push(item);
                }
            }
            let deleted = collection.deleted.read().map_err(|_| Error::LockError)?;
            let mut restores: Vec<_> = deleted
                .iter()
                .map(|entry| (entry.original_index, Arc::clone(&entry.item)))
                .collect();
            drop(deleted);
            restores.sort_by_key(|(index, _)| *index);
            for (index, item) in restores {
                members.insert(index.min(members.len()), item);
            }
            members
        }
    };

    for member in members {
        let element = snapshot_object(&member, kind, context)?;
        let mut guard = copy.write().map_err(|_| Error::LockError)?;
        guard.push(element);
    }
    Ok(copy)
}

/// Deep-copies an untracked instance. With no wrapper there is no ledger, so both
/// snapshot kinds read the live values; nested references still route through the
/// graph in case a tracked instance is reachable from an untracked one.
fn snapshot_plain(
    target: &TrackableRc,
    kind: SnapshotKind,
    context: &mut SnapshotContext,
) -> Result<TrackableRc> {
    let key = identity::object_key(target);
    if let Some(existing) = context.objects.get(&key) {
        return Ok(Arc::clone(existing));
    }

    let copy = {
        let guard = target.read().map_err(|_| Error::LockError)?;
        guard.new_default()
    };
    context.objects.insert(key, Arc::clone(&copy));

    let descriptors = {
        let guard = target.read().map_err(|_| Error::LockError)?;
        guard.properties()
    };
    for descriptor in descriptors {
        let value = {
            let guard = target.read().map_err(|_| Error::LockError)?;
            guard.get_value(descriptor.name).unwrap_or(Value::Null)
        };
        let value = snapshot_value(&value, kind, context)?;
        let mut guard = copy.write().map_err(|_| Error::LockError)?;
        guard.set_value(descriptor.name, value);
    }
    Ok(copy)
}

fn snapshot_plain_list(
    list: &TrackableListRc,
    kind: SnapshotKind,
    context: &mut SnapshotContext,
) -> Result<TrackableListRc> {
    let key = identity::list_key(list);
    if let Some(existing) = context.lists.get(&key) {
        return Ok(Arc::clone(existing));
    }

    let copy: TrackableListRc = Arc::new(RwLock::new(Vec::new()));
    context.lists.insert(key, Arc::clone(&copy));

    let members = list.read().map_err(|_| Error::LockError)?.clone();
    for member in members {
        let element = match snapshot_value(&Value::Object(member), kind, context)? {
            Value::Object(element) => element,
            // snapshot_value maps objects to objects.
            _ => continue,
        };
        let mut guard = copy.write().map_err(|_| Error::LockError)?;
        guard.push(element);
    }
    Ok(copy)
}
