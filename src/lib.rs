// Copyright 2025 graphtrack contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # graphtrack
//!
//! Transparent, automatic change tracking for arbitrary object graphs: per-object
//! `Unchanged`/`Added`/`Changed`/`Deleted` status, original-value ledgers, recursive
//! accept and rollback across nested objects and collections (cycles included), plain
//! unwrapped snapshots, and transactional edit sessions. Host types stay free of
//! tracking code; they expose their properties once through the [`Trackable`] seam and
//! the engine does the rest.
//!
//! ## Features
//!
//! - **Per-object ledger** - every tracked object remembers the pre-mutation value of
//!   each changed property and settles back to `Unchanged` when all are reverted
//! - **Identity-aware wrapping** - one wrapper per underlying instance per session, so
//!   diamond references and cycles are handled without duplication or infinite loops
//! - **Collection diffing** - live items are partitioned by status and removed items
//!   are parked in a deleted bucket that rollback restores at the original indexes
//! - **Snapshots** - `original()` and `current()` materialize plain, tracking-free
//!   deep copies of the graph
//! - **Edit sessions** - `begin_edit`/`cancel_edit`/`end_edit` bracket a set of writes
//!   that can be discarded as one unit
//! - **Synchronous notifications** - `StatusChanged` and `PropertyChanged` observers
//!   with re-entrancy guarding
//!
//! ## Quick Start
//!
//! Implement [`Trackable`] for a host type, then hand an instance to [`track`]:
//!
//! ```rust
//! use std::sync::{Arc, RwLock};
//! use graphtrack::prelude::*;
//!
//! #[derive(Default)]
//! struct Order {
//!     customer: String,
//! }
//!
//! static ORDER_PROPERTIES: [PropertyDescriptor; 1] = [PropertyDescriptor::scalar("Customer")];
//!
//! impl Trackable for Order {
//!     fn type_name(&self) -> &'static str {
//!         "Order"
//!     }
//!
//!     fn properties(&self) -> &'static [PropertyDescriptor] {
//!         &ORDER_PROPERTIES
//!     }
//!
//!     fn get_value(&self, property: &str) -> Option<Value> {
//!         match property {
//!             "Customer" => Some(Value::from(self.customer.clone())),
//!             _ => None,
//!         }
//!     }
//!
//!     fn set_value(&mut self, property: &str, value: Value) -> bool {
//!         match property {
//!             "Customer" => {
//!                 if let Some(text) = value.as_text() {
//!                     self.customer = text.to_string();
//!                 }
//!                 true
//!             }
//!             _ => false,
//!         }
//!     }
//!
//!     fn new_default(&self) -> TrackableRc {
//!         Arc::new(RwLock::new(Order::default()))
//!     }
//! }
//!
//! fn main() -> graphtrack::Result<()> {
//!     let order: TrackableRc = Arc::new(RwLock::new(Order {
//!         customer: "Test".to_string(),
//!     }));
//!
//!     let tracked = track(order)?;
//!     tracked.set("Customer", "Test1")?;
//!     assert_eq!(tracked.status()?, ChangeStatus::Changed);
//!     assert_eq!(tracked.original_value("Customer")?.as_text(), Some("Test"));
//!
//!     tracked.reject_changes()?;
//!     assert_eq!(tracked.get("Customer")?.as_text(), Some("Test"));
//!     assert_eq!(tracked.status()?, ChangeStatus::Unchanged);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized in two layers:
//!
//! - [`crate::trackable`] - the interception seam: the [`Trackable`] trait, the
//!   dynamic [`Value`] type and the static property descriptor tables
//! - [`crate::tracking`] - the engine: wrappers, ledgers, the identity graph,
//!   recursive propagation, snapshots and edit sessions
//!
//! ## Thread Safety
//!
//! Wrappers are `Send + Sync`; concurrent reads (including racing first-time child
//! resolution) are safe and observe one wrapper per instance. Writes to one wrapper
//! must be serialized by the caller.

#[macro_use]
pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

pub mod prelude;
pub mod trackable;
pub mod tracking;

pub use error::{Error, Result};
pub use trackable::{
    PropertyDescriptor, PropertyKind, Trackable, TrackableListRc, TrackableRc, Value,
};
pub use tracking::{
    track, track_collection, track_with, ChangeStatus, StatusTransition, TrackedCollection,
    TrackedCollectionRc, TrackedObject, TrackedObjectRc, TrackingSettings,
};
