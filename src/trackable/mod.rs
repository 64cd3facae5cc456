//! The interception seam between the tracking engine and host types.
//!
//! The engine never generates code and never reflects over host types: the host supplies
//! the interception capability by implementing [`Trackable`], an explicit getter/setter
//! indirection through which the engine observes every property access. A tracked object
//! is shared as [`TrackableRc`]; a tracked collection as [`TrackableListRc`].
//!
//! # Key Components
//!
//! - [`Trackable`] - the property-access contract a host type implements once
//! - [`Value`] - the dynamic value exchanged through getters and setters
//! - [`PropertyDescriptor`] / [`PropertyKind`] - the static per-type property table
//!
//! # Architecture
//!
//! The engine treats the trait as an opaque capability: it recovers property names from
//! the descriptor table, reads pre-mutation values through [`Trackable::get_value`],
//! applies writes and rollbacks through [`Trackable::set_value`], and materializes plain
//! snapshot copies through [`Trackable::new_default`]. Host types therefore contain no
//! tracking code; all tracking state lives in the engine's wrappers.
//!
//! # Thread Safety
//!
//! `Trackable` requires [`Send`] + [`Sync`] so wrappers can be shared across threads for
//! concurrent reads. Mutation of a single underlying instance is still the caller's
//! responsibility to serialize, exactly as for the wrappers themselves.

mod descriptor;
mod value;

pub use descriptor::{PropertyDescriptor, PropertyKind};
pub use value::Value;

use std::sync::{Arc, RwLock};

/// Shared handle to a trackable instance.
pub type TrackableRc = Arc<RwLock<dyn Trackable>>;

/// Shared handle to an ordered collection of trackable instances.
pub type TrackableListRc = Arc<RwLock<Vec<TrackableRc>>>;

/// Property-access contract implemented by host types that want change tracking.
///
/// Implementations expose their mutable properties by name through [`Value`]-typed
/// getters and setters, plus a static descriptor table the engine uses to decide which
/// properties get child wrappers. The trait is the only thing a host type has to
/// provide; the tracking behavior itself is entirely external.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, RwLock};
/// use graphtrack::{PropertyDescriptor, Trackable, TrackableRc, Value};
///
/// #[derive(Default)]
/// struct Customer {
///     name: String,
/// }
///
/// static CUSTOMER_PROPERTIES: [PropertyDescriptor; 1] = [PropertyDescriptor::scalar("Name")];
///
/// impl Trackable for Customer {
///     fn type_name(&self) -> &'static str {
///         "Customer"
///     }
///
///     fn properties(&self) -> &'static [PropertyDescriptor] {
///         &CUSTOMER_PROPERTIES
///     }
///
///     fn get_value(&self, property: &str) -> Option<Value> {
///         match property {
///             "Name" => Some(Value::from(self.name.clone())),
///             _ => None,
///         }
///     }
///
///     fn set_value(&mut self, property: &str, value: Value) -> bool {
///         match property {
///             "Name" => {
///                 if let Some(text) = value.as_text() {
///                     self.name = text.to_string();
///                 }
///                 true
///             }
///             _ => false,
///         }
///     }
///
///     fn new_default(&self) -> TrackableRc {
///         Arc::new(RwLock::new(Customer::default()))
///     }
/// }
/// ```
pub trait Trackable: Send + Sync {
    /// Name of the tracked type, used in diagnostics and error messages.
    fn type_name(&self) -> &'static str;

    /// Static descriptor table for this type's mutable properties.
    ///
    /// The table doubles as the per-type eligibility cache: kind and exclusion are
    /// decided once, at declaration.
    fn properties(&self) -> &'static [PropertyDescriptor];

    /// Reads the current value of `property`, or `None` if no such property exists.
    fn get_value(&self, property: &str) -> Option<Value>;

    /// Writes `value` into `property`, returning `false` if no such property exists.
    ///
    /// Implementations should ignore values of the wrong shape rather than panic; the
    /// engine only ever writes back values previously read from the same property.
    fn set_value(&mut self, property: &str, value: Value) -> bool;

    /// Creates a fresh default-constructed instance of this type.
    ///
    /// The parameterless-constructor analog used by snapshot materialization: the engine
    /// fills the returned instance property by property to build plain, unwrapped copies.
    fn new_default(&self) -> TrackableRc;

    /// Per-type "do not track" marker.
    ///
    /// A type returning true here is never wrapped: top-level tracking fails with
    /// `InvalidState`, and complex properties holding such a value get no child wrapper.
    fn tracking_excluded(&self) -> bool {
        false
    }
}
