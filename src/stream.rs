//! Minimal multicast stream: the push/subscribe primitive backing every
//! handler (spec §6, component B).
//!
//! This is a concrete type, not a trait-behind-a-seam: the spec says "the
//! exact library is not part of the contract," which in practice means
//! `pulse-core` is free to be its own sole implementer. Delivery is
//! synchronous to all current subscribers, and a push after a subscriber has
//! unsubscribed is a silent no-op (spec §5, "the stream must tolerate
//! post-unsubscribe pushes as drops").

use std::cell::RefCell;
use std::rc::Rc;

type Listener<T> = Rc<dyn Fn(&T)>;

struct StreamInner<T> {
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
    next_id: std::cell::Cell<u64>,
}

/// A push-based multicast stream of `T`.
///
/// Cloning a `Stream` shares the same underlying subscriber list (it is an
/// `Rc` handle), matching the handler's "stream facet is fixed at
/// construction" invariant (spec §3): every clone observes the same pushes.
pub struct Stream<T> {
    inner: Rc<StreamInner<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Stream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Stream<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StreamInner {
                listeners: RefCell::new(Vec::new()),
                next_id: std::cell::Cell::new(0),
            }),
        }
    }

    /// Subscribes `on_next` to future pushes. Returns a handle whose
    /// `unsubscribe()` removes it. Subscribing during an in-progress `push`
    /// (e.g. a listener registering another listener) is safe: the new
    /// subscriber simply does not see the push already in flight, since the
    /// listener list is snapshotted before iteration.
    pub fn subscribe(&self, on_next: impl Fn(&T) + 'static) -> Unsubscribe<T> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(on_next)));
        Unsubscribe {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Delivers `value` synchronously to every subscriber currently
    /// registered. Subscribers added or removed by a callback invoked here
    /// do not affect this push's delivery set.
    pub fn push(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for listener in snapshot {
            listener(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

/// A handle returned by [`Stream::subscribe`]. Unsubscribing after the
/// stream itself has been dropped is a safe no-op.
pub struct Unsubscribe<T> {
    inner: std::rc::Weak<StreamInner<T>>,
    id: u64,
}

impl<T> Unsubscribe<T> {
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}
