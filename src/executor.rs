//! Minimal single-threaded future driver backing deferred transforms (spec
//! §4.C's promise-flattening requirement) without pulling in an async
//! runtime by default.
//!
//! A transform's `Propagated::Deferred(fut)` needs *something* to poll it to
//! completion. Rather than require Tokio unconditionally, this module wires
//! a future's `Waker` straight back into the owning [`Runtime`]'s pure
//! queue: waking a pending future re-enqueues one more poll, so resumption
//! rides the same ordering guarantees as everything else rather than
//! spawning a second, independent execution context.

use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use crate::error::HaltMarker;
use crate::runtime::Runtime;
use crate::transform::PulseFuture;

struct Task<O> {
    future: std::cell::RefCell<Option<PulseFuture<O>>>,
    on_complete: std::cell::RefCell<Option<Box<dyn FnOnce(Result<O, HaltMarker>)>>>,
    runtime: Runtime,
}

fn vtable<O: 'static>() -> &'static RawWakerVTable {
    &RawWakerVTable::new(clone_raw::<O>, wake_raw::<O>, wake_by_ref_raw::<O>, drop_raw::<O>)
}

fn into_raw_waker<O: 'static>(task: Rc<Task<O>>) -> RawWaker {
    RawWaker::new(Rc::into_raw(task) as *const (), vtable::<O>())
}

unsafe fn clone_raw<O: 'static>(ptr: *const ()) -> RawWaker {
    let task = Rc::from_raw(ptr as *const Task<O>);
    let cloned = Rc::clone(&task);
    std::mem::forget(task);
    into_raw_waker(cloned)
}

unsafe fn wake_raw<O: 'static>(ptr: *const ()) {
    let task = Rc::from_raw(ptr as *const Task<O>);
    schedule_poll(task);
}

unsafe fn wake_by_ref_raw<O: 'static>(ptr: *const ()) {
    let task = Rc::from_raw(ptr as *const Task<O>);
    let cloned = Rc::clone(&task);
    std::mem::forget(task);
    schedule_poll(cloned);
}

unsafe fn drop_raw<O: 'static>(ptr: *const ()) {
    std::mem::drop(Rc::from_raw(ptr as *const Task<O>));
}

/// Re-enqueues a poll attempt onto the owning runtime's pure queue rather
/// than polling inline from inside the waker call, so a future that wakes
/// itself synchronously cannot recurse the call stack.
fn schedule_poll<O: 'static>(task: Rc<Task<O>>) {
    let runtime = task.runtime.clone();
    runtime.scheduler().enqueue_pure(move || poll_once(task));
    runtime.schedule_flush();
}

fn poll_once<O: 'static>(task: Rc<Task<O>>) {
    let mut slot = task.future.borrow_mut();
    let pending = match slot.as_mut() {
        Some(future) => future,
        None => return,
    };
    let waker = unsafe { Waker::from_raw(into_raw_waker(Rc::clone(&task))) };
    let mut cx = Context::from_waker(&waker);
    match pending.as_mut().poll(&mut cx) {
        Poll::Pending => {}
        Poll::Ready(result) => {
            *slot = None;
            drop(slot);
            if let Some(on_complete) = task.on_complete.borrow_mut().take() {
                on_complete(result);
            }
        }
    }
}

/// Drives `future` to completion on `runtime`, invoking `on_complete` with
/// the eventual `Ok`/halt result exactly once.
pub(crate) fn spawn_local<O: 'static>(
    runtime: Runtime,
    future: PulseFuture<O>,
    on_complete: impl FnOnce(Result<O, HaltMarker>) + 'static,
) {
    let task = Rc::new(Task {
        future: std::cell::RefCell::new(Some(future)),
        on_complete: std::cell::RefCell::new(Some(Box::new(on_complete))),
        runtime,
    });
    poll_once(task);
}
