//! Hierarchical keyed topic tree, layered over [`crate::event::create_event`]
//! (spec §4.H).
//!
//! Every node in the tree holds an optional `(Handler, Emitter)` pair plus a
//! `BTreeMap` of children keyed by string segment; nodes are created on
//! demand the first time something subscribes at a path. `BTreeMap` rather
//! than a hash map, for the same reason the rest of this crate favors
//! ordered maps wherever iteration order is externally observable (logging,
//! tests): deterministic ordering, not performance.
//!
//! Payloads travel as `serde_json::Value` internally; `T` on
//! [`create_topic`] is a phantom type describing the schema the caller has
//! in mind, not something this module inspects — consumers deserialize
//! individual node payloads into whatever shape fits that node.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::event::{create_event_with, Emitter};
use crate::handler::Handler;
use crate::runtime::Runtime;

struct TopicNode {
    event: Option<(Handler<Value>, Emitter<Value>)>,
    children: BTreeMap<String, TopicNode>,
}

impl TopicNode {
    fn new() -> Self {
        Self {
            event: None,
            children: BTreeMap::new(),
        }
    }
}

/// The subscribe side of a topic (spec: `onTopic`).
pub struct TopicHandler<T> {
    runtime: Runtime,
    root: Rc<RefCell<TopicNode>>,
    _schema: PhantomData<T>,
}

impl<T> Clone for TopicHandler<T> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            root: self.root.clone(),
            _schema: PhantomData,
        }
    }
}

/// The emit side of a topic (spec: `emitTopic`).
pub struct TopicEmitter<T> {
    runtime: Runtime,
    root: Rc<RefCell<TopicNode>>,
    _schema: PhantomData<T>,
}

impl<T> Clone for TopicEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            root: self.root.clone(),
            _schema: PhantomData,
        }
    }
}

pub fn create_topic<T>() -> (TopicHandler<T>, TopicEmitter<T>) {
    create_topic_with(Runtime::current())
}

pub fn create_topic_with<T>(runtime: Runtime) -> (TopicHandler<T>, TopicEmitter<T>) {
    let root = Rc::new(RefCell::new(TopicNode::new()));
    (
        TopicHandler {
            runtime: runtime.clone(),
            root: root.clone(),
            _schema: PhantomData,
        },
        TopicEmitter {
            runtime,
            root,
            _schema: PhantomData,
        },
    )
}

impl<T> TopicHandler<T> {
    /// Navigates to (creating on demand) the node at `path`, ensures it has
    /// a backing event, and returns its `Handler<Value>` — the Rust shape
    /// of `onTopic('a','b')` (variadic keys, no transform yet). Chain
    /// `.subscribe(transform)` on the result for `onTopic(..., transform)`;
    /// there is no separate overload, since an untransformed `Handler` is
    /// already a perfectly good partially-applied accessor in this crate's
    /// terms.
    pub fn on(&self, path: &[&str]) -> Handler<Value> {
        let mut root = self.root.borrow_mut();
        let mut node = &mut *root;
        for key in path {
            node = node
                .children
                .entry((*key).to_string())
                .or_insert_with(TopicNode::new);
        }
        let runtime = self.runtime.clone();
        let (handler, emitter) = node
            .event
            .get_or_insert_with(|| create_event_with::<Value>(runtime))
            .clone();
        let _ = emitter; // retained on the node; only the handler is returned here.
        handler
    }
}

impl<T> TopicEmitter<T> {
    /// `emitTopic(...keys, payload)` (spec §4.H). `payload` is serialized to
    /// a `serde_json::Value`; the fan-out algorithm below then notifies:
    /// - the exact node at `keys`, with the payload as given, when the
    ///   payload is an object (the "top-level key-path node is still
    ///   emitted to with the full object" rule);
    /// - every node on the path from the root down to each primitive leaf
    ///   found inside `payload` (including `payload` itself, when it is
    ///   already a primitive), wrapped to reconstruct the suffix of keys
    ///   between that ancestor and the leaf.
    pub fn emit(&self, path: &[&str], payload: impl Serialize) {
        let value = serde_json::to_value(payload).expect("topic payload must serialize to JSON");
        let keys: Vec<String> = path.iter().map(|k| (*k).to_string()).collect();

        if matches!(value, Value::Object(_)) {
            self.emit_at(&keys, value.clone());
        }

        for (relative, leaf) in decompose(&value) {
            let absolute: Vec<String> = keys.iter().cloned().chain(relative).collect();
            for i in 0..=absolute.len() {
                let wrapped = wrap_suffix(&absolute[i..], leaf.clone());
                self.emit_at(&absolute[..i], wrapped);
            }
        }
    }

    fn emit_at(&self, path: &[String], value: Value) {
        let root = self.root.borrow();
        let mut node = &*root;
        for key in path {
            match node.children.get(key) {
                Some(child) => node = child,
                None => return,
            }
        }
        if let Some((_, emitter)) = &node.event {
            emitter.emit(value);
        }
    }
}

/// Splits `value` into `(relative_path, primitive_leaf)` pairs by
/// recursively walking own enumerable object keys; arrays and scalars are
/// leaves, matching §9's explicit restriction ("recurse only for plain
/// objects").
fn decompose(value: &Value) -> Vec<(Vec<String>, Value)> {
    match value {
        Value::Object(map) => {
            let mut leaves = Vec::new();
            for (key, child) in map {
                for (mut relative, leaf) in decompose(child) {
                    relative.insert(0, key.clone());
                    leaves.push((relative, leaf));
                }
            }
            leaves
        }
        other => vec![(Vec::new(), other.clone())],
    }
}

fn wrap_suffix(suffix: &[String], value: Value) -> Value {
    suffix.iter().rev().fold(value, |acc, key| {
        let mut map = Map::new();
        map.insert(key.clone(), acc);
        Value::Object(map)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    #[test]
    fn direct_key_emission_reaches_its_own_subscriber() {
        let runtime = Runtime::new();
        let (on, emit) = create_topic_with::<Value>(runtime);
        let seen: Rc<StdRefCell<Vec<Value>>> = Rc::new(StdRefCell::new(Vec::new()));
        let seen2 = seen.clone();
        on.on(&["a"]).stream().subscribe(move |v: &Value| seen2.borrow_mut().push(v.clone()));

        emit.emit(&["a"], 1);

        assert_eq!(*seen.borrow(), vec![Value::from(1)]);
    }

    #[test]
    fn emitting_a_primitive_or_the_equivalent_object_is_observably_identical() {
        let runtime = Runtime::new();
        let (on, emit) = create_topic_with::<Value>(runtime.clone());
        let via_key: Rc<StdRefCell<Vec<Value>>> = Rc::new(StdRefCell::new(Vec::new()));
        let v1 = via_key.clone();
        on.on(&["a"]).stream().subscribe(move |v: &Value| v1.borrow_mut().push(v.clone()));
        emit.emit(&["a"], 7);
        let first_pass = via_key.borrow().clone();

        let (on2, emit2) = create_topic_with::<Value>(runtime);
        let via_object: Rc<StdRefCell<Vec<Value>>> = Rc::new(StdRefCell::new(Vec::new()));
        let v2 = via_object.clone();
        on2.on(&["a"]).stream().subscribe(move |v: &Value| v2.borrow_mut().push(v.clone()));
        emit2.emit(&[], serde_json::json!({ "a": 7 }));

        assert_eq!(first_pass, *via_object.borrow());
    }

    #[test]
    fn a_deep_primitive_emission_fans_out_to_every_ancestor_with_an_event() {
        let runtime = Runtime::new();
        let (on, emit) = create_topic_with::<Value>(runtime);
        let b_seen: Rc<StdRefCell<Vec<Value>>> = Rc::new(StdRefCell::new(Vec::new()));
        let bs = b_seen.clone();
        on.on(&["b"]).stream().subscribe(move |v: &Value| bs.borrow_mut().push(v.clone()));
        let bc_seen: Rc<StdRefCell<Vec<Value>>> = Rc::new(StdRefCell::new(Vec::new()));
        let bcs = bc_seen.clone();
        on.on(&["b", "c"]).stream().subscribe(move |v: &Value| bcs.borrow_mut().push(v.clone()));

        emit.emit(&["b", "c"], 3);

        assert_eq!(*b_seen.borrow(), vec![serde_json::json!({"c": 3})]);
        assert_eq!(*bc_seen.borrow(), vec![Value::from(3)]);
    }
}
