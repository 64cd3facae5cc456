//! Dynamic property values exchanged across the interception seam.
//!
//! [`Value`] is the single currency between the engine and host types: every property
//! read returns one, every property write supplies one, and the per-object ledger stores
//! them as pre-mutation originals.
//!
//! # Equality
//!
//! Scalars compare by value. [`Value::Object`] and [`Value::List`] compare by reference
//! identity (`Arc::ptr_eq`) - two distinct instances with equal contents are different
//! values. Reference identity is what the identity graph keys on, so equality here and
//! wrapper idempotence agree with each other.

use std::fmt;
use std::sync::Arc;

use crate::trackable::{TrackableListRc, TrackableRc};

/// A dynamically typed property value.
///
/// Covers the scalar types tracked types are expected to expose plus references to
/// nested objects and collections. Cloning is cheap: scalars copy, references bump an
/// `Arc` count.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value (unset optional property).
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Owned text.
    Text(String),
    /// Reference to another trackable object.
    Object(TrackableRc),
    /// Reference to an ordered collection of trackable objects.
    List(TrackableListRc),
}

impl Value {
    /// Returns true if this value is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the floating point payload, if any.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the referenced object, if this is [`Value::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&TrackableRc> {
        match self {
            Value::Object(target) => Some(target),
            _ => None,
        }
    }

    /// Returns the referenced collection, if this is [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&TrackableListRc> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(flag) => write!(f, "Bool({flag})"),
            Value::Int(number) => write!(f, "Int({number})"),
            Value::Float(number) => write!(f, "Float({number})"),
            Value::Text(text) => write!(f, "Text({text:?})"),
            Value::Object(target) => write!(f, "Object(0x{:x})", Arc::as_ptr(target) as *const () as usize),
            Value::List(list) => write!(f, "List(0x{:x})", Arc::as_ptr(list) as usize),
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Int(i64::from(number))
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Int(number)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Float(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<TrackableRc> for Value {
    fn from(target: TrackableRc) -> Self {
        Value::Object(target)
    }
}

impl From<TrackableListRc> for Value {
    fn from(list: TrackableListRc) -> Self {
        Value::List(list)
    }
}
