//! Topic tree fan-out contracts (spec §4.H): direct key emission, deep
//! primitive fan-out to ancestor nodes, and the object/primitive
//! equivalence property.

#[path = "contracts/support/mod.rs"]
mod support;

use proptest::prelude::*;
use pulse_core::{create_topic_with, Stream};
use serde_json::{json, Value};
use support::{fresh_runtime, Recorder};

#[test]
fn subscribing_before_and_after_creation_observes_the_same_node() {
    let runtime = fresh_runtime();
    let (on, emit) = create_topic_with::<Value>(runtime);
    let a1 = on.on(&["a"]);
    let a2 = on.on(&["a"]);
    assert_eq!(a1.stream().subscriber_count(), 0);

    let recorder: Recorder<Value> = Recorder::new();
    let r = recorder.clone();
    let _sub: pulse_core::Unsubscribe<Value> = subscribe_stream(a1.stream(), move |v| r.push(v.clone()));

    emit.emit(&["a"], 9);

    assert_eq!(a2.stream().subscriber_count(), 1);
    assert_eq!(recorder.snapshot(), vec![Value::from(9)]);
}

fn subscribe_stream(
    stream: &Stream<Value>,
    f: impl Fn(&Value) + 'static,
) -> pulse_core::Unsubscribe<Value> {
    stream.subscribe(f)
}

#[test]
fn a_deep_object_emission_reaches_the_exact_node_and_its_parent() {
    let runtime = fresh_runtime();
    let (on, emit) = create_topic_with::<Value>(runtime);

    let b_events: Recorder<Value> = Recorder::new();
    let rb = b_events.clone();
    on.on(&["b"]).stream().subscribe(move |v: &Value| rb.push(v.clone()));
    let bc_events: Recorder<Value> = Recorder::new();
    let rbc = bc_events.clone();
    on.on(&["b", "c"]).stream().subscribe(move |v: &Value| rbc.push(v.clone()));

    emit.emit(&["b"], json!({ "c": 2 }));

    assert!(b_events.snapshot().contains(&json!({"c": 2})));
    assert_eq!(bc_events.snapshot(), vec![Value::from(2)]);
}

proptest! {
    #[test]
    fn emitting_a_primitive_at_a_key_matches_emitting_the_equivalent_single_field_object(
        value in any::<i32>(),
    ) {
        let runtime_direct = fresh_runtime();
        let (on_direct, emit_direct) = create_topic_with::<Value>(runtime_direct);
        let direct: Recorder<Value> = Recorder::new();
        let rd = direct.clone();
        on_direct.on(&["a"]).stream().subscribe(move |v: &Value| rd.push(v.clone()));
        emit_direct.emit(&["a"], value);

        let runtime_object = fresh_runtime();
        let (on_object, emit_object) = create_topic_with::<Value>(runtime_object);
        let via_object: Recorder<Value> = Recorder::new();
        let ro = via_object.clone();
        on_object.on(&["a"]).stream().subscribe(move |v: &Value| ro.push(v.clone()));
        emit_object.emit(&[], json!({ "a": value }));

        prop_assert_eq!(direct.snapshot(), via_object.snapshot());
    }
}
