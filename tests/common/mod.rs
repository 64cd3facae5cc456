//! Host types shared by the integration tests: an order with scalar, complex and
//! collection properties, its line items, and a person type for cyclic graphs.

#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use graphtrack::prelude::*;

static ORDER_PROPERTIES: [PropertyDescriptor; 4] = [
    PropertyDescriptor::scalar("Id"),
    PropertyDescriptor::scalar("Customer"),
    PropertyDescriptor::complex("Shipping"),
    PropertyDescriptor::collection("Lines"),
];

#[derive(Default)]
pub struct Order {
    pub id: i64,
    pub customer: String,
    pub shipping: Option<TrackableRc>,
    pub lines: Option<TrackableListRc>,
}

impl Trackable for Order {
    fn type_name(&self) -> &'static str {
        "Order"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        &ORDER_PROPERTIES
    }

    fn get_value(&self, property: &str) -> Option<Value> {
        match property {
            "Id" => Some(Value::Int(self.id)),
            "Customer" => Some(Value::from(self.customer.clone())),
            "Shipping" => Some(match &self.shipping {
                Some(shipping) => Value::Object(Arc::clone(shipping)),
                None => Value::Null,
            }),
            "Lines" => Some(match &self.lines {
                Some(lines) => Value::List(Arc::clone(lines)),
                None => Value::Null,
            }),
            _ => None,
        }
    }

    fn set_value(&mut self, property: &str, value: Value) -> bool {
        match property {
            "Id" => {
                if let Some(id) = value.as_int() {
                    self.id = id;
                }
                true
            }
            "Customer" => {
                if let Some(text) = value.as_text() {
                    self.customer = text.to_string();
                }
                true
            }
            "Shipping" => {
                self.shipping = value.as_object().cloned();
                true
            }
            "Lines" => {
                self.lines = value.as_list().cloned();
                true
            }
            _ => false,
        }
    }

    fn new_default(&self) -> TrackableRc {
        Arc::new(RwLock::new(Order::default()))
    }
}

static LINE_PROPERTIES: [PropertyDescriptor; 2] = [
    PropertyDescriptor::scalar("Product"),
    PropertyDescriptor::scalar("Qty"),
];

#[derive(Default)]
pub struct OrderLine {
    pub product: String,
    pub qty: i64,
}

impl Trackable for OrderLine {
    fn type_name(&self) -> &'static str {
        "OrderLine"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        &LINE_PROPERTIES
    }

    fn get_value(&self, property: &str) -> Option<Value> {
        match property {
            "Product" => Some(Value::from(self.product.clone())),
            "Qty" => Some(Value::Int(self.qty)),
            _ => None,
        }
    }

    fn set_value(&mut self, property: &str, value: Value) -> bool {
        match property {
            "Product" => {
                if let Some(text) = value.as_text() {
                    self.product = text.to_string();
                }
                true
            }
            "Qty" => {
                if let Some(qty) = value.as_int() {
                    self.qty = qty;
                }
                true
            }
            _ => false,
        }
    }

    fn new_default(&self) -> TrackableRc {
        Arc::new(RwLock::new(OrderLine::default()))
    }
}

static PERSON_PROPERTIES: [PropertyDescriptor; 2] = [
    PropertyDescriptor::scalar("Name"),
    PropertyDescriptor::complex("Friend"),
];

#[derive(Default)]
pub struct Person {
    pub name: String,
    pub friend: Option<TrackableRc>,
}

impl Trackable for Person {
    fn type_name(&self) -> &'static str {
        "Person"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        &PERSON_PROPERTIES
    }

    fn get_value(&self, property: &str) -> Option<Value> {
        match property {
            "Name" => Some(Value::from(self.name.clone())),
            "Friend" => Some(match &self.friend {
                Some(friend) => Value::Object(Arc::clone(friend)),
                None => Value::Null,
            }),
            _ => None,
        }
    }

    fn set_value(&mut self, property: &str, value: Value) -> bool {
        match property {
            "Name" => {
                if let Some(text) = value.as_text() {
                    self.name = text.to_string();
                }
                true
            }
            "Friend" => {
                self.friend = value.as_object().cloned();
                true
            }
            _ => false,
        }
    }

    fn new_default(&self) -> TrackableRc {
        Arc::new(RwLock::new(Person::default()))
    }
}

pub fn order(id: i64, customer: &str) -> TrackableRc {
    Arc::new(RwLock::new(Order {
        id,
        customer: customer.to_string(),
        shipping: None,
        lines: None,
    }))
}

pub fn order_with_lines(id: i64, customer: &str, lines: Vec<TrackableRc>) -> TrackableRc {
    Arc::new(RwLock::new(Order {
        id,
        customer: customer.to_string(),
        shipping: None,
        lines: Some(Arc::new(RwLock::new(lines))),
    }))
}

pub fn order_line(product: &str, qty: i64) -> TrackableRc {
    Arc::new(RwLock::new(OrderLine {
        product: product.to_string(),
        qty,
    }))
}

pub fn person(name: &str) -> TrackableRc {
    Arc::new(RwLock::new(Person {
        name: name.to_string(),
        friend: None,
    }))
}

/// Points `a`'s friend reference at `b`, bypassing tracking.
pub fn befriend(a: &TrackableRc, b: &TrackableRc) {
    a.write()
        .unwrap()
        .set_value("Friend", Value::Object(Arc::clone(b)));
}

pub fn order_list(orders: Vec<TrackableRc>) -> TrackableListRc {
    Arc::new(RwLock::new(orders))
}

/// Ten orders with ids 0..10.
pub fn ten_orders() -> TrackableListRc {
    order_list((0..10).map(|id| order(id, &format!("Customer{id}"))).collect())
}
