//! Benchmarks for the tracking engine hot paths:
//! - Property writes through the ledger pipeline
//! - Child wrapper resolution (cold and cached)
//! - Recursive accept/reject over a populated collection

extern crate graphtrack;

use criterion::{criterion_group, criterion_main, Criterion};
use graphtrack::prelude::*;
use std::hint::black_box;
use std::sync::{Arc, RwLock};

static ITEM_PROPERTIES: [PropertyDescriptor; 2] = [
    PropertyDescriptor::scalar("Name"),
    PropertyDescriptor::complex("Child"),
];

#[derive(Default)]
struct Item {
    name: String,
    child: Option<TrackableRc>,
}

impl Trackable for Item {
    fn type_name(&self) -> &'static str {
        "Item"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        &ITEM_PROPERTIES
    }

    fn get_value(&self, property: &str) -> Option<Value> {
        match property {
            "Name" => Some(Value::from(self.name.clone())),
            "Child" => Some(match &self.child {
                Some(child) => Value::Object(Arc::clone(child)),
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
            "Child" => {
                self.child = value.as_object().cloned();
                true
            }
            _ => false,
        }
    }

    fn new_default(&self) -> TrackableRc {
        Arc::new(RwLock::new(Item::default()))
    }
}

fn item(name: &str) -> TrackableRc {
    Arc::new(RwLock::new(Item {
        name: name.to_string(),
        child: None,
    }))
}

fn item_with_child(name: &str) -> TrackableRc {
    Arc::new(RwLock::new(Item {
        name: name.to_string(),
        child: Some(item("child")),
    }))
}

/// Benchmark one write through the full pipeline: descriptor lookup, ledger update,
/// underlying write, notification delivery.
fn bench_property_write(c: &mut Criterion) {
    let tracked = track(item("bench")).unwrap();
    let mut flip = false;

    c.bench_function("property_write", |b| {
        b.iter(|| {
            flip = !flip;
            let value = if flip { "a" } else { "b" };
            tracked.set("Name", black_box(value)).unwrap();
        });
    });
}

/// Benchmark resolving a complex property after the wrapper is cached.
fn bench_child_resolution_cached(c: &mut Criterion) {
    let tracked = track(item_with_child("bench")).unwrap();
    // Warm the cache.
    tracked.get_object("Child").unwrap().unwrap();

    c.bench_function("child_resolution_cached", |b| {
        b.iter(|| {
            let child = tracked.get_object(black_box("Child")).unwrap().unwrap();
            black_box(child)
        });
    });
}

/// Benchmark opening a fresh tracking session on an object with one child.
fn bench_track_cold(c: &mut Criterion) {
    c.bench_function("track_cold", |b| {
        b.iter(|| {
            let tracked = track(item_with_child("bench")).unwrap();
            let child = tracked.get_object("Child").unwrap().unwrap();
            black_box(child)
        });
    });
}

/// Benchmark a full mutate-then-reject cycle over a 100-element collection.
fn bench_collection_reject(c: &mut Criterion) {
    c.bench_function("collection_reject_100", |b| {
        b.iter(|| {
            let list: TrackableListRc = Arc::new(RwLock::new(
                (0..100).map(|i| item(&format!("item{i}"))).collect(),
            ));
            let tracked = track_collection(list, TrackingSettings::default()).unwrap();
            tracked.remove_at(0).unwrap();
            tracked.get(10).unwrap().set("Name", "edited").unwrap();
            tracked.reject_changes().unwrap();
            black_box(tracked.len().unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_property_write,
    bench_child_resolution_cached,
    bench_track_cold,
    bench_collection_reject
);
criterion_main!(benches);
