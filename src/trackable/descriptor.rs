//! Per-type property descriptor tables.
//!
//! Every [`crate::trackable::Trackable`] type publishes a static table of
//! [`PropertyDescriptor`] entries describing its mutable properties. The table is the
//! engine's per-type eligibility cache: because it is a `&'static` slice built by the
//! host at compile time, the "is this property complex-trackable / collection-trackable /
//! excluded" test is evaluated exactly once per type by construction.

/// The shape of a single tracked property.
///
/// The kind decides how the engine treats the property's value: scalars participate only
/// in the per-object ledger, while complex and collection properties additionally get a
/// lazily resolved child wrapper so changes propagate through the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// A plain value (number, text, flag). No child wrapper is ever created.
    Scalar,
    /// A reference to another trackable object ([`crate::Value::Object`]).
    Complex,
    /// An ordered collection of trackable objects ([`crate::Value::List`]).
    Collection,
}

/// Descriptor for one mutable property of a trackable type.
///
/// Descriptors are declared as `static` arrays by the host type, so property names carry
/// the `'static` lifetime and can be used as ledger and cache keys without allocation.
///
/// # Examples
///
/// ```rust
/// use graphtrack::{PropertyDescriptor, PropertyKind};
///
/// static ORDER_PROPERTIES: [PropertyDescriptor; 3] = [
///     PropertyDescriptor::scalar("Id"),
///     PropertyDescriptor::complex("Shipping"),
///     PropertyDescriptor::collection("Lines"),
/// ];
///
/// assert_eq!(ORDER_PROPERTIES[1].kind, PropertyKind::Complex);
/// assert!(!ORDER_PROPERTIES[1].exclude);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property name, unique within the declaring type.
    pub name: &'static str,
    /// How the engine treats the property's value.
    pub kind: PropertyKind,
    /// Per-property "do not track" marker: the value is still read and written through
    /// the wrapper and recorded in the ledger, but no child wrapper is created for it.
    pub exclude: bool,
}

impl PropertyDescriptor {
    /// Creates a descriptor for a scalar property.
    #[must_use]
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Scalar,
            exclude: false,
        }
    }

    /// Creates a descriptor for a complex (nested object) property.
    #[must_use]
    pub const fn complex(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Complex,
            exclude: false,
        }
    }

    /// Creates a descriptor for a collection property.
    #[must_use]
    pub const fn collection(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Collection,
            exclude: false,
        }
    }

    /// Marks this property as excluded from child tracking.
    #[must_use]
    pub const fn excluded(self) -> Self {
        Self {
            exclude: true,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        assert_eq!(PropertyDescriptor::scalar("A").kind, PropertyKind::Scalar);
        assert_eq!(PropertyDescriptor::complex("B").kind, PropertyKind::Complex);
        assert_eq!(
            PropertyDescriptor::collection("C").kind,
            PropertyKind::Collection
        );
    }

    #[test]
    fn excluded_preserves_name_and_kind() {
        let descriptor = PropertyDescriptor::complex("Secret").excluded();
        assert_eq!(descriptor.name, "Secret");
        assert_eq!(descriptor.kind, PropertyKind::Complex);
        assert!(descriptor.exclude);
    }
}
