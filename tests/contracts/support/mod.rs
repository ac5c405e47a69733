//! Deterministic test harness shared by the contract suites.
//!
//! Every test runs against a fresh [`pulse_core::Runtime`] built with the
//! default [`pulse_core::ImmediateDriver`], so `emit`/`flush_queues` always
//! complete synchronously before the call returns — no sleeping, no
//! polling, no flakiness from wall-clock timing.

use std::cell::RefCell;
use std::rc::Rc;

use pulse_core::Runtime;

/// A shared, clonable recorder for assembling an observed ordering/value
/// sequence across several closures.
#[derive(Clone, Default)]
pub struct Recorder<T> {
    events: Rc<RefCell<Vec<T>>>,
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: T) {
        self.events.borrow_mut().push(value);
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.events.borrow().clone()
    }
}

pub fn fresh_runtime() -> Runtime {
    Runtime::new()
}
