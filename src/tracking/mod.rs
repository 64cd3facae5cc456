//! Change tracking engine for object graphs.
//!
//! This module wires the engine together: per-object ledgers, collection membership
//! bookkeeping, the identity graph that keeps wrapping idempotent, child resolution,
//! recursive accept/reject, snapshots and transactional edit sessions.
//!
//! # Key Components
//!
//! - [`track`] / [`track_with`] / [`track_collection`] - entry points that open a
//!   tracking session on a root instance or list
//! - [`TrackedObject`] - per-object wrapper: status, original-value ledger, child
//!   wrappers, notifications, edit session
//! - [`TrackedCollection`] - per-list wrapper: live sequence, deleted bucket,
//!   membership rollback
//! - [`ChangeStatus`] / [`StatusTransition`] - the per-object state machine and its
//!   observable transitions
//! - [`TrackingSettings`] - per-session configuration captured at `track` time
//!
//! # Architecture
//!
//! A top-level tracking call creates a fresh identity graph scoped to that session.
//! Every wrapper created for instances reachable from the root registers in the graph,
//! which guarantees at most one wrapper per underlying instance and thereby terminates
//! recursive operations on cyclic graphs. Recursive operations additionally thread a
//! per-call visited set so each wrapper participates exactly once per walk.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use graphtrack::{track, ChangeStatus};
//!
//! let order = make_order();
//! let tracked = track(order)?;
//!
//! tracked.set("Customer", "Test1")?;
//! assert_eq!(tracked.status()?, ChangeStatus::Changed);
//!
//! tracked.reject_changes()?;
//! assert_eq!(tracked.get("Customer")?.as_text(), Some("Test"));
//! # Ok::<(), graphtrack::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All wrappers are `Send + Sync`. Reads, including racing first-time child
//! resolution, are safe from multiple threads and observe one wrapper per instance.
//! Writes to a single wrapper are not serialized internally and must be serialized by
//! the caller.

use std::sync::Arc;

use crate::{Error, Result, TrackableListRc, TrackableRc};

mod collection;
mod edit;
mod events;
pub(crate) mod identity;
mod object;
mod propagation;
mod resolver;
mod settings;
mod snapshot;
mod state;
mod status;

pub use collection::{TrackedCollection, TrackedCollectionRc};
pub use object::{TrackedObject, TrackedObjectRc};
pub use settings::TrackingSettings;
pub use status::{ChangeStatus, StatusTransition};

pub(crate) use identity::IdentityGraph;

/// Opens a tracking session on `target` with `Unchanged` status and default settings.
///
/// A fresh identity graph is created for the session; every instance reachable from
/// `target` through complex and collection properties is wrapped (lazily) into the
/// same session.
///
/// # Errors
///
/// [`Error::InvalidState`] if `target`'s type is excluded from tracking.
pub fn track(target: TrackableRc) -> Result<TrackedObjectRc> {
    track_with(target, ChangeStatus::Unchanged, TrackingSettings::default())
}

/// Opens a tracking session on `target` with an explicit initial status and settings.
///
/// # Errors
///
/// [`Error::InvalidState`] if `target`'s type is excluded from tracking.
pub fn track_with(
    target: TrackableRc,
    status: ChangeStatus,
    settings: TrackingSettings,
) -> Result<TrackedObjectRc> {
    {
        let guard = target.read().map_err(|_| Error::LockError)?;
        if guard.tracking_excluded() {
            return Err(invalid_state_error!(
                "type '{}' is excluded from tracking",
                guard.type_name()
            ));
        }
    }
    let graph = Arc::new(IdentityGraph::new());
    Ok(graph.resolve_object_or(&target, || {
        TrackedObject::create(Arc::clone(&target), status, settings, Arc::clone(&graph))
    }))
}

/// Opens a tracking session on a list.
///
/// Under [`TrackingSettings::wrap_items_eagerly`] every element is wrapped
/// `Unchanged` immediately; otherwise wrapping happens on the first collection
/// operation.
pub fn track_collection(
    list: TrackableListRc,
    settings: TrackingSettings,
) -> Result<TrackedCollectionRc> {
    let graph = Arc::new(IdentityGraph::new());
    let wrapper = graph.resolve_collection_or(&list, || {
        TrackedCollection::create(Arc::clone(&list), settings, Arc::clone(&graph))
    });
    if settings.wrap_items_eagerly {
        wrapper.ensure_wrapped()?;
    }
    Ok(wrapper)
}
