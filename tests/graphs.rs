//! Graph-shaped tracking: nested objects, shared references, and cycles.

mod common;

use std::sync::{Arc, Mutex};

use common::{befriend, order, person};
use graphtrack::prelude::*;

#[test]
fn nested_change_surfaces_on_the_root() {
    let a = person("a");
    befriend(&a, &person("b"));
    let tracked = track(a).unwrap();

    let friend = tracked.get_object("Friend").unwrap().unwrap();
    friend.set("Name", "renamed").unwrap();

    assert_eq!(tracked.status().unwrap(), ChangeStatus::Unchanged);
    assert!(tracked.is_changed().unwrap());
}

#[test]
fn accept_recurses_into_children() {
    let a = person("a");
    befriend(&a, &person("b"));
    let tracked = track(a).unwrap();

    let friend = tracked.get_object("Friend").unwrap().unwrap();
    friend.set("Name", "renamed").unwrap();
    tracked.accept_changes().unwrap();

    assert_eq!(friend.status().unwrap(), ChangeStatus::Unchanged);
    assert_eq!(
        friend.original_value("Name").unwrap().as_text(),
        Some("renamed")
    );
    assert!(!tracked.is_changed().unwrap());
}

#[test]
fn reject_recurses_into_children() {
    let a = person("a");
    befriend(&a, &person("b"));
    let tracked = track(a).unwrap();

    let friend = tracked.get_object("Friend").unwrap().unwrap();
    friend.set("Name", "renamed").unwrap();
    tracked.reject_changes().unwrap();

    assert_eq!(friend.get("Name").unwrap().as_text(), Some("b"));
    assert!(!tracked.is_changed().unwrap());
}

#[test]
fn accept_recurses_even_if_child_was_never_read() {
    let a = person("a");
    let b = person("b");
    befriend(&a, &b);
    let tracked = track(a).unwrap();

    // `Friend` is never read before the walk.
    tracked.accept_changes().unwrap();

    // The child got resolved by the walk and is now tracked.
    let friend = tracked.get_object("Friend").unwrap().unwrap();
    assert_eq!(friend.status().unwrap(), ChangeStatus::Unchanged);
}

#[test]
fn shared_reference_resolves_to_one_wrapper() {
    let shared = person("shared");
    let a = person("a");
    let b = person("b");
    befriend(&a, &shared);
    befriend(&b, &shared);

    // Both parents live in one graph reached from a common root.
    let root = person("root");
    befriend(&root, &a);
    let tracked = track(root).unwrap();

    let via_a = tracked
        .get_object("Friend")
        .unwrap()
        .unwrap()
        .get_object("Friend")
        .unwrap()
        .unwrap();
    let again = tracked
        .get_object("Friend")
        .unwrap()
        .unwrap()
        .get_object("Friend")
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&via_a, &again));
}

#[test]
fn cyclic_graph_accept_and_reject_terminate() {
    let a = person("a");
    let b = person("b");
    befriend(&a, &b);
    befriend(&b, &a);

    let tracked = track(Arc::clone(&a)).unwrap();
    let friend = tracked.get_object("Friend").unwrap().unwrap();
    friend.set("Name", "renamed").unwrap();

    tracked.accept_changes().unwrap();
    assert!(!tracked.is_changed().unwrap());

    friend.set("Name", "again").unwrap();
    tracked.reject_changes().unwrap();
    assert!(!tracked.is_changed().unwrap());
    assert_eq!(friend.get("Name").unwrap().as_text(), Some("renamed"));
}

#[test]
fn cycle_back_to_the_root_returns_the_root_wrapper() {
    let a = person("a");
    let b = person("b");
    befriend(&a, &b);
    befriend(&b, &a);

    let tracked = track(a).unwrap();
    let back = tracked
        .get_object("Friend")
        .unwrap()
        .unwrap()
        .get_object("Friend")
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&back, &tracked));
}

#[test]
fn cyclic_snapshot_preserves_the_cycle() {
    let a = person("a");
    let b = person("b");
    befriend(&a, &b);
    befriend(&b, &a);

    let tracked = track(a).unwrap();
    let copy_a = tracked.current().unwrap();

    let copy_b = copy_a
        .read()
        .unwrap()
        .get_value("Friend")
        .unwrap()
        .as_object()
        .cloned()
        .unwrap();
    let back = copy_b
        .read()
        .unwrap()
        .get_value("Friend")
        .unwrap()
        .as_object()
        .cloned()
        .unwrap();
    assert!(Arc::ptr_eq(&back, &copy_a));
}

#[test]
fn child_status_change_raises_property_changed_on_parent() {
    let a = person("a");
    befriend(&a, &person("b"));
    let tracked = track(a).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    tracked.on_property_changed(move |name| sink.lock().unwrap().push(name.to_string()));

    let friend = tracked.get_object("Friend").unwrap().unwrap();
    friend.set("Name", "renamed").unwrap();

    assert!(seen.lock().unwrap().contains(&"Friend".to_string()));
}

#[test]
fn replacing_a_complex_reference_tracks_the_new_target() {
    let a = person("a");
    befriend(&a, &person("b"));
    let tracked = track(a).unwrap();
    let old_friend = tracked.get_object("Friend").unwrap().unwrap();

    let replacement = person("c");
    tracked
        .set("Friend", Value::Object(Arc::clone(&replacement)))
        .unwrap();

    assert_eq!(tracked.status().unwrap(), ChangeStatus::Changed);
    let new_friend = tracked.get_object("Friend").unwrap().unwrap();
    assert!(!Arc::ptr_eq(&new_friend, &old_friend));
    assert!(Arc::ptr_eq(&new_friend.target(), &replacement));

    // Rolling back restores the old reference and its wrapper.
    tracked.reject_changes().unwrap();
    let restored = tracked.get_object("Friend").unwrap().unwrap();
    assert!(Arc::ptr_eq(&restored, &old_friend));
}

#[test]
fn null_write_clears_the_child_wrapper() {
    let a = person("a");
    befriend(&a, &person("b"));
    let tracked = track(a).unwrap();
    assert!(tracked.get_object("Friend").unwrap().is_some());

    tracked.set("Friend", Value::Null).unwrap();
    assert!(tracked.get_object("Friend").unwrap().is_none());
    assert_eq!(tracked.status().unwrap(), ChangeStatus::Changed);
}

#[test]
fn disabled_complex_tracking_still_tracks_scalars() {
    let a = person("a");
    befriend(&a, &person("b"));
    let settings = TrackingSettings {
        track_complex_properties: false,
        ..TrackingSettings::default()
    };
    let tracked = track_with(a, ChangeStatus::Unchanged, settings).unwrap();

    assert!(tracked.get_object("Friend").unwrap().is_none());
    tracked.set("Name", "renamed").unwrap();
    assert_eq!(tracked.status().unwrap(), ChangeStatus::Changed);
}

#[test]
fn order_graph_round_trip() {
    let tracked = track(order(1, "Test")).unwrap();
    tracked.set("Customer", "Test1").unwrap();
    assert_eq!(tracked.status().unwrap(), ChangeStatus::Changed);
    assert_eq!(
        tracked.original_value("Customer").unwrap().as_text(),
        Some("Test")
    );

    tracked.accept_changes().unwrap();
    assert_eq!(tracked.status().unwrap(), ChangeStatus::Unchanged);
    assert_eq!(
        tracked.original_value("Customer").unwrap().as_text(),
        Some("Test1")
    );
}

#[test]
fn racing_first_time_resolution_observes_one_wrapper() {
    use std::sync::Barrier;
    use std::thread;

    let a = person("a");
    befriend(&a, &person("b"));
    let tracked = track(a).unwrap();

    // Both threads hit the unresolved property at the same time; exactly one
    // registration wins and both observe the winning wrapper.
    let barrier = Arc::new(Barrier::new(2));
    let resolve = |tracked: TrackedObjectRc, barrier: Arc<Barrier>| {
        thread::spawn(move || {
            barrier.wait();
            tracked.get_object("Friend").unwrap().unwrap()
        })
    };
    let first = resolve(Arc::clone(&tracked), Arc::clone(&barrier));
    let second = resolve(Arc::clone(&tracked), Arc::clone(&barrier));

    let first = first.join().unwrap();
    let second = second.join().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
