//! # graphtrack Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the graphtrack library. Import this module to get quick access to the essential
//! types for change tracking.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all graphtrack operations
pub use crate::Error;

/// The result type used throughout graphtrack
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Opens a tracking session on a root instance
pub use crate::track;

/// Opens a tracking session with an explicit initial status and settings
pub use crate::track_with;

/// Opens a tracking session on a list
pub use crate::track_collection;

/// Per-session tracking configuration
pub use crate::TrackingSettings;

// ================================================================================================
// Wrappers and Status
// ================================================================================================

/// The per-object tracking wrapper and its shared handle
pub use crate::{TrackedObject, TrackedObjectRc};

/// The per-list tracking wrapper and its shared handle
pub use crate::{TrackedCollection, TrackedCollectionRc};

/// Lifecycle status of a tracked object
pub use crate::ChangeStatus;

/// A single observable status transition
pub use crate::StatusTransition;

// ================================================================================================
// Interception Seam
// ================================================================================================

/// The property-access contract host types implement
pub use crate::Trackable;

/// Shared handles to trackable instances and collections
pub use crate::{TrackableListRc, TrackableRc};

/// The dynamic value exchanged through getters and setters
pub use crate::Value;

/// Static per-type property metadata
pub use crate::{PropertyDescriptor, PropertyKind};
