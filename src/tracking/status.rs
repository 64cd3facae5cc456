//! Change status of a tracked object.

use strum::Display;

/// Lifecycle status of one tracked object relative to the last accepted state.
///
/// Transitions are driven by the per-object ledger: `Unchanged` becomes `Changed` on the
/// first recorded mutation and falls back to `Unchanged` when every mutated property is
/// reverted to its original value. `Added` is sticky - mutating an added object keeps it
/// `Added`. `Deleted` forbids further mutation entirely.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChangeStatus {
    /// No pending mutations since tracking began or since the last accept.
    #[default]
    Unchanged,
    /// Introduced into a tracked collection after tracking began.
    Added,
    /// At least one property currently differs from its original value.
    Changed,
    /// Removed from a tracked collection; mutation is forbidden.
    Deleted,
}

/// A single status transition, carried by `StatusChanged` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    /// Status before the transition.
    pub from: ChangeStatus,
    /// Status after the transition.
    pub to: ChangeStatus,
}

impl StatusTransition {
    pub(crate) fn new(from: ChangeStatus, to: ChangeStatus) -> Self {
        Self { from, to }
    }
}
