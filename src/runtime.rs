//! Runtime: the scheduler context handlers and topics are built against,
//! plus the microtask-deferred flush seam (spec §4.E, §9).
//!
//! `createEvent`/`createTopic` in the original spec read as free functions
//! operating against implicit global queues. Per §9's explicit
//! recommendation this crate threads an explicit [`Runtime`] handle instead
//! of reaching for true globals, while [`Runtime::current`] keeps the common
//! single-runtime-per-process case as simple as the spec's worked examples.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::scheduler::Scheduler;

/// A deferred-execution primitive: "run this callback after the current
/// task." Spec §9 is explicit that any host providing this suffices — the
/// contract is ordering ("before any further emits from new tasks"), not
/// wall-clock timing.
pub trait MicrotaskDriver {
    fn schedule(&self, f: Box<dyn FnOnce()>);
}

/// Runs the scheduled callback synchronously, inline. Correct whenever there
/// is no external task system driving the process — which includes this
/// crate's own test suite, since deterministic tests want the flush to have
/// happened by the time `schedule` returns.
pub struct ImmediateDriver;

impl MicrotaskDriver for ImmediateDriver {
    fn schedule(&self, f: Box<dyn FnOnce()>) {
        f();
    }
}

/// Schedules the flush onto the current Tokio runtime via a spawned task,
/// approximating a microtask turn with a yielded task. Requires a Tokio
/// runtime to already be entered (`#[tokio::main]` or
/// `Runtime::enter`) — panics otherwise, matching `tokio::spawn`'s own
/// behavior.
#[cfg(feature = "tokio")]
pub struct TokioMicrotaskDriver;

#[cfg(feature = "tokio")]
impl MicrotaskDriver for TokioMicrotaskDriver {
    fn schedule(&self, f: Box<dyn FnOnce()>) {
        // `f` is `!Send`-free of captured Rc state in practice (pulse-core
        // is single-threaded), so we run it on a `LocalSet`-free spawn via
        // `spawn_blocking`-free inline yield: schedule it to run after the
        // current task yields once, on the same thread.
        tokio::task::spawn_local(async move {
            tokio::task::yield_now().await;
            f();
        });
    }
}

/// Runtime construction knobs (spec SPEC_FULL.md §8). Intentionally small:
/// the spec's Non-goals leave no config surface for backpressure, replay, or
/// distribution to hang off of.
pub struct RuntimeConfig {
    pub initial_queue_capacity: usize,
    pub microtask_driver: Rc<dyn MicrotaskDriver>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_queue_capacity: 16,
            microtask_driver: Rc::new(ImmediateDriver),
        }
    }
}

struct RuntimeInner {
    scheduler: Scheduler,
    driver: Rc<dyn MicrotaskDriver>,
    scheduled: Cell<bool>,
    flushing: Cell<bool>,
}

/// The scheduler context every `Handler`/`Emitter`/`TopicHandler` in a given
/// subgraph shares. Cheap to clone (an `Rc` handle); all clones observe the
/// same queues.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler: Scheduler::new(config.initial_queue_capacity),
                driver: config.microtask_driver,
                scheduled: Cell::new(false),
                flushing: Cell::new(false),
            }),
        }
    }

    /// The thread-local default runtime, created lazily on first use. Covers
    /// the common case where an application only ever needs one runtime and
    /// does not want to thread a handle through every `create_event` call.
    pub fn current() -> Self {
        thread_local! {
            static DEFAULT: RefCell<Option<Runtime>> = const { RefCell::new(None) };
        }
        DEFAULT.with(|cell| {
            let mut slot = cell.borrow_mut();
            slot.get_or_insert_with(Runtime::new).clone()
        })
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Explicit drain, exposed for diagnostics and deterministic tests (spec
    /// §6: `flushQueues()`). Emitters already call this after enqueuing;
    /// application code normally never needs to call it directly.
    ///
    /// Guarded against reentrant calls: with [`ImmediateDriver`], every
    /// `schedule_flush()` invoked while a flush is already running (the
    /// overwhelmingly common case — each step of propagation schedules one)
    /// would otherwise recurse straight back into here. Only the outermost
    /// call actually drains; a reentrant call just clears the coalescing
    /// flag and returns, trusting the outer call's own pure-then-mutation-
    /// then-listener pass to pick up whatever it enqueued.
    pub fn flush_queues(&self) {
        if self.inner.flushing.get() {
            self.inner.scheduled.set(false);
            return;
        }
        self.inner.flushing.set(true);
        self.inner.scheduled.set(false);
        self.inner.scheduler.flush_queues();
        self.inner.flushing.set(false);
    }

    /// Diagnostic logging of queue depths (spec §6: `introspectQueues()`).
    pub fn introspect_queues(&self) {
        self.inner.scheduler.log_depths();
    }

    /// Requests a deferred flush via the configured [`MicrotaskDriver`],
    /// coalescing concurrent requests so a burst of listener registrations
    /// schedules at most one pending flush (spec §4.E: "`scheduleFlush` — a
    /// microtask-deferred flush").
    pub(crate) fn schedule_flush(&self) {
        if self.inner.scheduled.replace(true) {
            return;
        }
        let this = self.clone();
        self.inner.driver.schedule(Box::new(move || {
            this.flush_queues();
        }));
    }
}
