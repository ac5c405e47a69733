//! Three-queue scheduler (spec §4.E): the cross-cutting ordering guarantee
//! that makes the rest of the core predictable.
//!
//! > When a value is emitted, all pure transforms propagate to fixpoint
//! > before any mutation effects run, and all mutation effects run before
//! > any listener effects. Within a queue, enqueue order is preserved.
//!
//! State here used to be "process-wide" in the spec's description; per §9's
//! recommendation this crate parameterizes it by a scheduler context
//! ([`crate::runtime::Runtime`]) instead of true global statics, so tests can
//! run isolated instances side by side.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

type Thunk = Box<dyn FnOnce()>;

/// Queue identity, used only for [`Scheduler::introspect`] logging labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum QueueKind {
    Pure,
    Mutation,
    Listener,
}

impl QueueKind {
    fn label(self) -> &'static str {
        match self {
            QueueKind::Pure => "pure",
            QueueKind::Mutation => "mutation",
            QueueKind::Listener => "listener",
        }
    }
}

pub(crate) struct Scheduler {
    pure_queue: RefCell<VecDeque<Thunk>>,
    mutation_queue: RefCell<VecDeque<Thunk>>,
    listener_queue: RefCell<VecDeque<Thunk>>,
    pure_running: Cell<bool>,
    mutation_running: Cell<bool>,
    listener_running: Cell<bool>,
}

impl Scheduler {
    pub(crate) fn new(initial_queue_capacity: usize) -> Self {
        Self {
            pure_queue: RefCell::new(VecDeque::with_capacity(initial_queue_capacity)),
            mutation_queue: RefCell::new(VecDeque::with_capacity(initial_queue_capacity)),
            listener_queue: RefCell::new(VecDeque::with_capacity(initial_queue_capacity)),
            pure_running: Cell::new(false),
            mutation_running: Cell::new(false),
            listener_running: Cell::new(false),
        }
    }

    pub(crate) fn enqueue_pure(&self, task: impl FnOnce() + 'static) {
        self.pure_queue.borrow_mut().push_back(Box::new(task));
    }

    pub(crate) fn enqueue_mutation(&self, task: impl FnOnce() + 'static) {
        self.mutation_queue.borrow_mut().push_back(Box::new(task));
    }

    pub(crate) fn enqueue_listener(&self, task: impl FnOnce() + 'static) {
        self.listener_queue.borrow_mut().push_back(Box::new(task));
    }

    /// Drains `pure_queue`, then `mutation_queue`, then `listener_queue`, in
    /// that fixed order (spec §4.E). Each drain is reentrancy-guarded: a
    /// nested call arriving while a queue is already draining is a no-op for
    /// that queue, but the outer loop still reaches later queues once it
    /// gets there (spec §5, "Reentrancy").
    ///
    /// The pure queue drains with a shift-while-non-empty loop, so tasks
    /// enqueued by earlier pure tasks (the common case: propagation to a
    /// downstream handler) are drained within the same pass. Mutation and
    /// listener queues snapshot-iterate then clear, matching spec §4.E's
    /// description of their drain shape.
    ///
    /// A task that panics leaves the corresponding running flag set and lets
    /// the panic propagate out of `flush_queues`, exactly as spec §5
    /// describes ("implementers must either install a try/finally... or
    /// document the invariant that user tasks must not throw"). This crate
    /// documents the invariant rather than catching the panic, so a listener
    /// panic is visible to the caller instead of being silently absorbed.
    pub(crate) fn flush_queues(&self) {
        self.drain_pure();
        self.drain_mutation();
        self.drain_listener();
    }

    fn drain_pure(&self) {
        if self.pure_running.get() {
            return;
        }
        self.pure_running.set(true);
        loop {
            let task = self.pure_queue.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
        self.pure_running.set(false);
    }

    fn drain_mutation(&self) {
        if self.mutation_running.get() {
            return;
        }
        self.mutation_running.set(true);
        let snapshot: Vec<Thunk> = self.mutation_queue.borrow_mut().drain(..).collect();
        for task in snapshot {
            task();
        }
        self.mutation_running.set(false);
    }

    fn drain_listener(&self) {
        if self.listener_running.get() {
            return;
        }
        self.listener_running.set(true);
        let snapshot: Vec<Thunk> = self.listener_queue.borrow_mut().drain(..).collect();
        for task in snapshot {
            task();
        }
        self.listener_running.set(false);
    }

    /// Diagnostic queue-depth snapshot backing [`crate::runtime::Runtime::introspect_queues`].
    pub(crate) fn depths(&self) -> [(QueueKind, usize); 3] {
        [
            (QueueKind::Pure, self.pure_queue.borrow().len()),
            (QueueKind::Mutation, self.mutation_queue.borrow().len()),
            (QueueKind::Listener, self.listener_queue.borrow().len()),
        ]
    }

    pub(crate) fn log_depths(&self) {
        for (kind, depth) in self.depths() {
            tracing::info!(queue = kind.label(), depth, "pulse-core scheduler queue depth");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Rc;

    #[test]
    fn drains_in_fixed_order_and_reentrant_pure_work_joins_the_pass() {
        let scheduler = Rc::new(Scheduler::new(4));
        let log: Rc<StdRefCell<Vec<&'static str>>> = Rc::new(StdRefCell::new(Vec::new()));

        let scheduler2 = scheduler.clone();
        let log2 = log.clone();
        scheduler.enqueue_pure(move || {
            log2.borrow_mut().push("pure-1");
            // Reentrant emission from within a pure task.
            let log3 = log2.clone();
            scheduler2.enqueue_pure(move || log3.borrow_mut().push("pure-2"));
        });

        let log_m = log.clone();
        scheduler.enqueue_mutation(move || log_m.borrow_mut().push("mutation"));
        let log_l = log.clone();
        scheduler.enqueue_listener(move || log_l.borrow_mut().push("listener"));

        scheduler.flush_queues();

        assert_eq!(*log.borrow(), vec!["pure-1", "pure-2", "mutation", "listener"]);
    }

    #[test]
    fn queues_are_empty_after_a_full_drain() {
        let scheduler = Scheduler::new(4);
        scheduler.enqueue_pure(|| {});
        scheduler.enqueue_mutation(|| {});
        scheduler.enqueue_listener(|| {});

        scheduler.flush_queues();

        assert!(scheduler.depths().iter().all(|(_, depth)| *depth == 0));
    }
}
