//! Per-object change ledger.
//!
//! This module provides [`ChangeState`], the pure state machine behind every tracked
//! object: a [`crate::ChangeStatus`] plus the map from changed-property name to its
//! pre-mutation value. It knows nothing about children, events, or the underlying
//! instance - callers feed it observed writes and it answers with the resulting status
//! transition, if any.
//!
//! # Architecture
//!
//! The ledger is sparse: a property appears only while its current value differs from
//! its original. Writing a property back to its original value removes the entry again,
//! and an empty ledger on a `Changed` object transitions it back to `Unchanged`. This is
//! the same sparse-pending-modifications principle the rest of the engine builds on.
//!
//! # Thread Safety
//!
//! [`ChangeState`] itself is plain mutable data; the owning wrapper guards it with a
//! lock and serializes writes per the crate's concurrency contract.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::{
    tracking::{ChangeStatus, StatusTransition},
    Result, Value,
};

/// Outcome of feeding one observed property write into the ledger.
#[derive(Debug, PartialEq)]
pub(crate) enum WriteEffect {
    /// New value equals the current value: no event, no ledger change, no transition.
    Ignored,
    /// The write was recorded, possibly transitioning the status.
    Recorded(Option<StatusTransition>),
}

/// Status plus original-value ledger for one tracked object.
#[derive(Debug, Clone)]
pub(crate) struct ChangeState {
    status: ChangeStatus,
    original_values: HashMap<&'static str, Value>,
}

impl ChangeState {
    /// Creates a ledger with the given initial status and no recorded originals.
    pub(crate) fn new(status: ChangeStatus) -> Self {
        Self {
            status,
            original_values: HashMap::new(),
        }
    }

    /// Current status.
    pub(crate) fn status(&self) -> ChangeStatus {
        self.status
    }

    /// True if the ledger holds no original values.
    pub(crate) fn ledger_is_empty(&self) -> bool {
        self.original_values.is_empty()
    }

    /// Names of all properties with a recorded original value.
    pub(crate) fn changed_properties(&self) -> Vec<&'static str> {
        self.original_values.keys().copied().collect()
    }

    /// The recorded original for `property`, if the property has been mutated.
    pub(crate) fn original_value(&self, property: &str) -> Option<&Value> {
        self.original_values.get(property)
    }

    /// Feeds one observed write into the ledger.
    ///
    /// Fails with `InvalidState` if the object is `Deleted`. Equal old and new values
    /// are ignored entirely. Otherwise the first write to a property records `old` as
    /// its original, and a write back to the recorded original removes the entry;
    /// `Unchanged` and `Changed` transition accordingly while `Added` stays sticky.
    pub(crate) fn on_write(
        &mut self,
        property: &'static str,
        old: &Value,
        new: &Value,
    ) -> Result<WriteEffect> {
        if self.status == ChangeStatus::Deleted {
            return Err(invalid_state_error!(
                "cannot mutate property '{}' of a deleted object",
                property
            ));
        }
        if old == new {
            return Ok(WriteEffect::Ignored);
        }

        let mut transition = None;
        match self.original_values.entry(property) {
            Entry::Occupied(entry) => {
                if new == entry.get() {
                    entry.remove();
                    if self.original_values.is_empty() && self.status == ChangeStatus::Changed {
                        transition = Some(self.transition_to(ChangeStatus::Unchanged));
                    }
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(old.clone());
                if self.original_values.len() == 1 && self.status == ChangeStatus::Unchanged {
                    transition = Some(self.transition_to(ChangeStatus::Changed));
                }
            }
        }

        Ok(WriteEffect::Recorded(transition))
    }

    /// Commits all pending mutations: clears the ledger and settles `Changed`/`Added`
    /// into `Unchanged`. `Deleted` removal is owned by the enclosing collection and is
    /// left untouched here.
    pub(crate) fn accept(&mut self) -> Option<StatusTransition> {
        self.original_values.clear();
        match self.status {
            ChangeStatus::Changed | ChangeStatus::Added => {
                Some(self.transition_to(ChangeStatus::Unchanged))
            }
            _ => None,
        }
    }

    /// Drains the ledger for rollback and resets the status to `Unchanged`.
    ///
    /// The caller is responsible for writing each returned `(property, original)` pair
    /// back onto the live object.
    pub(crate) fn drain_for_reject(
        &mut self,
    ) -> (Vec<(&'static str, Value)>, Option<StatusTransition>) {
        let entries: Vec<_> = self.original_values.drain().collect();
        let transition = if self.status == ChangeStatus::Unchanged {
            None
        } else {
            Some(self.transition_to(ChangeStatus::Unchanged))
        };
        (entries, transition)
    }

    /// Forces the status to `to` without touching the ledger.
    ///
    /// Used by collection bookkeeping (delete, un-delete, re-insert reconciliation)
    /// where the status is driven by membership rather than by property writes.
    pub(crate) fn force_status(&mut self, to: ChangeStatus) -> Option<StatusTransition> {
        if self.status == to {
            return None;
        }
        Some(self.transition_to(to))
    }

    fn transition_to(&mut self, to: ChangeStatus) -> StatusTransition {
        let transition = StatusTransition::new(self.status, to);
        self.status = to;
        transition
    }
}
