//! The per-object tracking wrapper.
//!
//! This module provides [`TrackedObject`], the engine's stateful shadow of one
//! underlying instance. The wrapper owns the object's change ledger, its resolved
//! child wrappers, its notification registry and its edit session; the underlying
//! instance itself stays free of tracking code and is reachable through
//! [`TrackedObject::target`].
//!
//! # Architecture
//!
//! Every property write runs the same pipeline: validate the property name against the
//! type's descriptor table, validate the object's status (a `Deleted` object forbids
//! mutation), drop value-equal writes, capture the pre-write value into an open edit
//! session, feed the write into the ledger (capturing the original value and deciding
//! the status transition), apply the write to the underlying instance, refresh the
//! child-wrapper cache for complex and collection properties, and finally deliver
//! `PropertyChanged`/`StatusChanged` notifications. The pipeline validates before it
//! mutates, so a failing write commits nothing.
//!
//! Reads of complex and collection properties go through the wrapper's child resolver,
//! which consults the session's identity graph so that at most one wrapper exists per
//! underlying instance.
//!
//! # Thread Safety
//!
//! Wrappers are `Send + Sync`. Concurrent reads (including racing first-time child
//! resolution) are safe and observe a single winning wrapper per property; concurrent
//! writes to the same wrapper are not serialized by the engine and must be serialized
//! by the caller.

use std::sync::{Arc, Mutex, OnceLock, RwLock, Weak};

use crate::{
    tracking::{
        edit::{self, EditSession},
        identity::IdentityGraphRc,
        propagation::{self, VisitSet},
        resolver::{ChildResolver, ChildWrapper},
        snapshot::{self, SnapshotContext, SnapshotKind},
        state::{ChangeState, WriteEffect},
        ChangeStatus, StatusTransition, TrackedCollection, TrackedCollectionRc, TrackingSettings,
    },
    Error, PropertyDescriptor, PropertyKind, Result, TrackableRc, Value,
};

use super::events::EventRegistry;

/// Reference-counted handle to a [`TrackedObject`].
pub type TrackedObjectRc = Arc<TrackedObject>;

/// The engine's stateful shadow of one underlying instance.
///
/// Obtained from [`crate::track`], from a parent wrapper's complex property, or from a
/// tracked collection's live sequence. All tracking state - status, original-value
/// ledger, resolved children, edit session - lives here; the underlying instance is
/// never modified except by explicit writes and rollbacks.
///
/// # Examples
///
/// ```rust,ignore
/// use graphtrack::{track, ChangeStatus};
///
/// let wrapper = track(order)?;
/// wrapper.set("Customer", "Test1")?;
/// assert_eq!(wrapper.status()?, ChangeStatus::Changed);
/// assert_eq!(wrapper.original_value("Customer")?.as_text(), Some("Test"));
///
/// wrapper.accept_changes()?;
/// assert_eq!(wrapper.status()?, ChangeStatus::Unchanged);
/// # Ok::<(), graphtrack::Error>(())
/// ```
pub struct TrackedObject {
    pub(crate) target: TrackableRc,
    pub(crate) settings: TrackingSettings,
    pub(crate) graph: IdentityGraphRc,
    pub(crate) state: RwLock<ChangeState>,
    pub(crate) resolver: ChildResolver,
    pub(crate) events: EventRegistry,
    pub(crate) edit: Mutex<EditSession>,
    owner: OnceLock<Weak<TrackedCollection>>,
    pub(crate) self_ref: Weak<TrackedObject>,
}

impl TrackedObject {
    /// Creates a wrapper with the given initial status. Registration in the identity
    /// graph is the caller's job (all construction goes through the graph's
    /// resolve-or-register primitives).
    pub(crate) fn create(
        target: TrackableRc,
        status: ChangeStatus,
        settings: TrackingSettings,
        graph: IdentityGraphRc,
    ) -> TrackedObjectRc {
        Arc::new_cyclic(|self_ref| TrackedObject {
            target,
            settings,
            graph,
            state: RwLock::new(ChangeState::new(status)),
            resolver: ChildResolver::new(),
            events: EventRegistry::new(),
            edit: Mutex::new(EditSession::new()),
            owner: OnceLock::new(),
            self_ref: self_ref.clone(),
        })
    }

    /// The originally-wrapped underlying instance.
    #[must_use]
    pub fn target(&self) -> TrackableRc {
        Arc::clone(&self.target)
    }

    /// Name of the tracked type.
    pub fn type_name(&self) -> Result<&'static str> {
        Ok(self.target.read().map_err(|_| Error::LockError)?.type_name())
    }

    /// Current change status.
    pub fn status(&self) -> Result<ChangeStatus> {
        Ok(self.state.read().map_err(|_| Error::LockError)?.status())
    }

    /// Names of all properties whose current value differs from the original.
    pub fn changed_property_names(&self) -> Result<Vec<&'static str>> {
        Ok(self
            .state
            .read()
            .map_err(|_| Error::LockError)?
            .changed_properties())
    }

    /// Reads the current value of `property` from the underlying instance.
    ///
    /// Complex and collection properties come back as their raw references; use
    /// [`TrackedObject::get_object`] / [`TrackedObject::get_collection`] to navigate
    /// the tracked graph instead.
    pub fn get(&self, property: &str) -> Result<Value> {
        let descriptor = self.descriptor(property)?;
        self.read_raw(descriptor.name)
    }

    /// Writes `value` into `property` through the tracking pipeline.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProperty`] if the property does not exist on the tracked type;
    /// [`Error::InvalidState`] if this object's status is `Deleted`.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let descriptor = self.descriptor(property)?;
        let old = self.read_raw(descriptor.name)?;

        let transition = {
            let mut state = self.state.write().map_err(|_| Error::LockError)?;
            match state.on_write(descriptor.name, &old, &value)? {
                WriteEffect::Ignored => return Ok(()),
                WriteEffect::Recorded(transition) => transition,
            }
        };

        {
            let mut session = self.edit.lock().map_err(|_| Error::LockError)?;
            session.record_write(descriptor.name, &old, &value);
        }

        {
            let mut target = self.target.write().map_err(|_| Error::LockError)?;
            target.set_value(descriptor.name, value.clone());
        }

        self.resolver.refresh(self, descriptor, &value)?;

        self.events.fire_property(descriptor.name);
        if let Some(transition) = transition {
            self.events.fire_status(&transition);
        }
        Ok(())
    }

    /// Resolves the tracked wrapper for a complex property.
    ///
    /// Returns `None` if the property is currently null, excluded from tracking, or
    /// complex tracking is disabled in the session settings. The wrapper is created on
    /// first read and cached; subsequent reads return the same instance.
    pub fn get_object(&self, property: &str) -> Result<Option<TrackedObjectRc>> {
        let descriptor = self.descriptor(property)?;
        if descriptor.kind != PropertyKind::Complex {
            return Err(Error::NotSupported(format!(
                "property '{property}' is not a complex property"
            )));
        }
        match self.resolver.resolve(self, descriptor)? {
            Some(ChildWrapper::Object(wrapper)) => Ok(Some(wrapper)),
            _ => Ok(None),
        }
    }

    /// Resolves the tracked wrapper for a collection property.
    ///
    /// Returns `None` if the property is currently null, excluded from tracking, or
    /// collection tracking is disabled in the session settings.
    pub fn get_collection(&self, property: &str) -> Result<Option<TrackedCollectionRc>> {
        let descriptor = self.descriptor(property)?;
        if descriptor.kind != PropertyKind::Collection {
            return Err(Error::NotSupported(format!(
                "property '{property}' is not a collection property"
            )));
        }
        match self.resolver.resolve(self, descriptor)? {
            Some(ChildWrapper::Collection(wrapper)) => Ok(Some(wrapper)),
            _ => Ok(None),
        }
    }

    /// The pre-mutation value of `property`: the ledger entry if the property has been
    /// mutated, otherwise the current live value.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProperty`] for a name that does not exist on the tracked type.
    pub fn original_value(&self, property: &str) -> Result<Value> {
        let descriptor = self.descriptor(property)?;
        let recorded = {
            let state = self.state.read().map_err(|_| Error::LockError)?;
            state.original_value(descriptor.name).cloned()
        };
        match recorded {
            Some(value) => Ok(value),
            None => self.read_raw(descriptor.name),
        }
    }

    /// True if this object or any tracked descendant has pending mutations.
    pub fn is_changed(&self) -> Result<bool> {
        propagation::object_is_changed(self, &mut VisitSet::new())
    }

    /// Commits all pending mutations across this object and every tracked descendant.
    ///
    /// Afterwards every reachable wrapper is `Unchanged` with an empty ledger, and
    /// every collection's deleted bucket is cleared. Calling this twice in a row is
    /// equivalent to calling it once.
    pub fn accept_changes(&self) -> Result<()> {
        propagation::accept_object(self, &mut VisitSet::new())
    }

    /// Rolls back all pending mutations across this object and every tracked
    /// descendant, restoring recorded original values, reinserting deleted collection
    /// items at their original indexes, and removing items added since the last accept.
    pub fn reject_changes(&self) -> Result<()> {
        propagation::reject_object(self, &mut VisitSet::new())
    }

    /// Materializes a plain, unwrapped copy of the underlying object carrying the
    /// pre-mutation value of every property, recursively across the tracked graph.
    /// The copy retains no tracking behavior and is safe against cyclic graphs.
    pub fn original(&self) -> Result<TrackableRc> {
        let mut context = SnapshotContext::new(Arc::clone(&self.graph));
        snapshot::snapshot_object(self, SnapshotKind::Original, &mut context)
    }

    /// Materializes a plain, unwrapped copy of the underlying object carrying the
    /// current value of every property, recursively across the tracked graph.
    pub fn current(&self) -> Result<TrackableRc> {
        let mut context = SnapshotContext::new(Arc::clone(&self.graph));
        snapshot::snapshot_object(self, SnapshotKind::Current, &mut context)
    }

    /// Opens a transactional edit session on this object and every tracked descendant.
    /// A second `begin_edit` while a session is open is a no-op.
    pub fn begin_edit(&self) -> Result<()> {
        edit::begin_object(self, &mut VisitSet::new())
    }

    /// Discards the open edit session, restoring every property touched since
    /// `begin_edit` to its pre-edit value. Without an open session this is a no-op.
    pub fn cancel_edit(&self) -> Result<()> {
        edit::cancel_object(self, &mut VisitSet::new())
    }

    /// Commits the open edit session, keeping the in-progress values. Without an open
    /// session this is a no-op.
    pub fn end_edit(&self) -> Result<()> {
        edit::end_object(self, &mut VisitSet::new())
    }

    /// Registers an observer for status transitions of this wrapper.
    pub fn on_status_changed(&self, handler: impl Fn(&StatusTransition) + Send + Sync + 'static) {
        self.events.on_status(handler);
    }

    /// Registers an observer for property changes of this wrapper.
    pub fn on_property_changed(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        self.events.on_property(handler);
    }

    // ---- crate-internal helpers -------------------------------------------------

    /// Looks up the descriptor for `property`, failing with `UnknownProperty`.
    pub(crate) fn descriptor(&self, property: &str) -> Result<&'static PropertyDescriptor> {
        let (descriptors, type_name) = {
            let guard = self.target.read().map_err(|_| Error::LockError)?;
            (guard.properties(), guard.type_name())
        };
        descriptors
            .iter()
            .find(|descriptor| descriptor.name == property)
            .ok_or_else(|| Error::UnknownProperty {
                property: property.to_string(),
                type_name: type_name.to_string(),
            })
    }

    /// Reads the current value of `property` straight from the underlying instance.
    pub(crate) fn read_raw(&self, property: &str) -> Result<Value> {
        let guard = self.target.read().map_err(|_| Error::LockError)?;
        match guard.get_value(property) {
            Some(value) => Ok(value),
            None => Err(Error::UnknownProperty {
                property: property.to_string(),
                type_name: guard.type_name().to_string(),
            }),
        }
    }

    /// True if the ledger holds no original values.
    pub(crate) fn ledger_is_empty(&self) -> Result<bool> {
        Ok(self
            .state
            .read()
            .map_err(|_| Error::LockError)?
            .ledger_is_empty())
    }

    /// Forces a membership-driven status transition (delete, un-delete, re-insert
    /// reconciliation) and delivers the `StatusChanged` notification.
    pub(crate) fn transition_status(&self, to: ChangeStatus) -> Result<()> {
        let transition = {
            let mut state = self.state.write().map_err(|_| Error::LockError)?;
            state.force_status(to)
        };
        if let Some(transition) = transition {
            self.events.fire_status(&transition);
        }
        Ok(())
    }

    /// Marks this object `Deleted`, forbidding further mutation.
    pub(crate) fn mark_deleted(&self) -> Result<()> {
        self.transition_status(ChangeStatus::Deleted)
    }

    /// Records the collection this wrapper was inserted into. First owner wins; the
    /// back-reference serves new-item-add-then-cancel edit semantics. Returns true on
    /// the first attachment so the collection subscribes to the item exactly once.
    pub(crate) fn set_owner(&self, owner: Weak<TrackedCollection>) -> bool {
        self.owner.set(owner).is_ok()
    }

    /// The owning collection, if this wrapper was inserted into one and it is alive.
    pub(crate) fn owner(&self) -> Option<TrackedCollectionRc> {
        self.owner.get().and_then(Weak::upgrade)
    }
}
