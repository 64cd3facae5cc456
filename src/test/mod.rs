//! Shared fixtures for unit tests.
//!
//! `TestNode` is a minimal host type covering all three property kinds: a scalar
//! label, an optional complex child and an optional item collection.

use std::sync::{Arc, RwLock};

use crate::{PropertyDescriptor, Trackable, TrackableListRc, TrackableRc, Value};

static NODE_PROPERTIES: [PropertyDescriptor; 3] = [
    PropertyDescriptor::scalar("Label"),
    PropertyDescriptor::complex("Child"),
    PropertyDescriptor::collection("Items"),
];

#[derive(Default)]
pub(crate) struct TestNode {
    label: String,
    child: Option<TrackableRc>,
    items: Option<TrackableListRc>,
}

impl Trackable for TestNode {
    fn type_name(&self) -> &'static str {
        "TestNode"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        &NODE_PROPERTIES
    }

    fn get_value(&self, property: &str) -> Option<Value> {
        match property {
            "Label" => Some(Value::from(self.label.clone())),
            "Child" => Some(match &self.child {
                Some(child) => Value::Object(Arc::clone(child)),
                None => Value::Null,
            }),
            "Items" => Some(match &self.items {
                Some(items) => Value::List(Arc::clone(items)),
                None => Value::Null,
            }),
            _ => None,
        }
    }

    fn set_value(&mut self, property: &str, value: Value) -> bool {
        match property {
            "Label" => {
                if let Some(text) = value.as_text() {
                    self.label = text.to_string();
                }
                true
            }
            "Child" => {
                self.child = value.as_object().cloned();
                true
            }
            "Items" => {
                self.items = value.as_list().cloned();
                true
            }
            _ => false,
        }
    }

    fn new_default(&self) -> TrackableRc {
        Arc::new(RwLock::new(TestNode::default()))
    }
}

static UNTRACKED_PROPERTIES: [PropertyDescriptor; 1] = [PropertyDescriptor::scalar("Label")];

/// A host type whose instances opt out of tracking entirely.
pub(crate) struct UntrackedNode {
    label: String,
}

impl Trackable for UntrackedNode {
    fn type_name(&self) -> &'static str {
        "UntrackedNode"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        &UNTRACKED_PROPERTIES
    }

    fn get_value(&self, property: &str) -> Option<Value> {
        match property {
            "Label" => Some(Value::from(self.label.clone())),
            _ => None,
        }
    }

    fn set_value(&mut self, property: &str, value: Value) -> bool {
        match property {
            "Label" => {
                if let Some(text) = value.as_text() {
                    self.label = text.to_string();
                }
                true
            }
            _ => false,
        }
    }

    fn new_default(&self) -> TrackableRc {
        Arc::new(RwLock::new(UntrackedNode {
            label: String::new(),
        }))
    }

    fn tracking_excluded(&self) -> bool {
        true
    }
}

/// A fresh node with the given label and no children.
pub(crate) fn node(label: &str) -> TrackableRc {
    Arc::new(RwLock::new(TestNode {
        label: label.to_string(),
        child: None,
        items: None,
    }))
}

/// A fresh node whose type opts out of tracking.
pub(crate) fn untracked_node(label: &str) -> TrackableRc {
    Arc::new(RwLock::new(UntrackedNode {
        label: label.to_string(),
    }))
}

/// A fresh list holding the given nodes.
pub(crate) fn node_list(items: Vec<TrackableRc>) -> TrackableListRc {
    Arc::new(RwLock::new(items))
}

/// Points `parent`'s complex property at `child`, bypassing tracking.
pub(crate) fn set_child(parent: &TrackableRc, child: TrackableRc) {
    parent
        .write()
        .unwrap()
        .set_value("Child", Value::Object(child));
}

/// Points `parent`'s collection property at `items`, bypassing tracking.
pub(crate) fn set_items(parent: &TrackableRc, items: TrackableListRc) {
    parent
        .write()
        .unwrap()
        .set_value("Items", Value::List(items));
}
