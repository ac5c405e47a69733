//! Async transform and sync-listener contracts (spec §4.F, §4.G): a deferred
//! transform resolves through the hand-rolled executor, delivers downstream
//! on success, and a `create_sync_listener` observes the attempt starting
//! before it resolves.

#[path = "contracts/support/mod.rs"]
mod support;

use std::future::ready;

use pulse_core::{create_event_with, create_sync_listener, HaltMarker};
use support::{fresh_runtime, Recorder};

#[test]
fn an_immediately_ready_async_transform_delivers_downstream() {
    let runtime = fresh_runtime();
    let (on, emit) = create_event_with::<i32>(runtime);
    let async_handler = on.subscribe_async(|n: &i32| {
        let n = *n;
        Box::pin(ready(Ok(n * 2)))
    });

    let seen: Recorder<i32> = Recorder::new();
    let r = seen.clone();
    let _sub = async_handler.handler().stream().subscribe(move |v: &i32| r.push(*v));

    emit.emit(5);

    assert_eq!(seen.snapshot(), vec![10]);
}

#[test]
fn a_halted_async_transform_never_reaches_downstream() {
    let runtime = fresh_runtime();
    let (on, emit) = create_event_with::<i32>(runtime);
    let async_handler = on.subscribe_async(|n: &i32| {
        let n = *n;
        Box::pin(ready(if n < 0 {
            Err(HaltMarker::new(Some("negative".into())))
        } else {
            Ok(n)
        }))
    });

    let seen: Recorder<i32> = Recorder::new();
    let r = seen.clone();
    let _sub = async_handler.handler().stream().subscribe(move |v: &i32| r.push(*v));

    emit.emit(-1);
    emit.emit(3);

    assert_eq!(seen.snapshot(), vec![3]);
}

#[test]
fn an_async_transform_that_suspends_once_still_resumes_and_delivers_downstream() {
    let runtime = fresh_runtime();
    let (on, emit) = create_event_with::<i32>(runtime);
    let order: Recorder<String> = Recorder::new();

    let order_for_poll = order.clone();
    let async_handler = on.subscribe_async(move |n: &i32| {
        let future: std::pin::Pin<Box<dyn std::future::Future<Output = Result<i32, HaltMarker>>>> =
            Box::pin(SuspendOnce {
                polled: std::cell::Cell::new(false),
                value: n * 10,
                order: order_for_poll.clone(),
            });
        future
    });

    let order_for_delivery = order.clone();
    let _sub = async_handler
        .handler()
        .stream()
        .subscribe(move |v: &i32| order_for_delivery.push(format!("delivered:{v}")));

    emit.emit(3);

    assert_eq!(
        order.snapshot(),
        vec!["polled-pending", "polled-ready", "delivered:30"]
    );
}

/// A future that genuinely suspends on its first poll (returning `Pending`
/// without waking itself inline) and only completes once driven by a second,
/// externally-triggered poll — unlike `std::future::ready`, which resolves
/// on the very first poll and never exercises resumption.
struct SuspendOnce {
    polled: std::cell::Cell<bool>,
    value: i32,
    order: Recorder<String>,
}

impl std::future::Future for SuspendOnce {
    type Output = Result<i32, HaltMarker>;

    fn poll(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        if self.polled.replace(true) {
            self.order.push("polled-ready".to_string());
            std::task::Poll::Ready(Ok(self.value))
        } else {
            self.order.push("polled-pending".to_string());
            cx.waker().wake_by_ref();
            std::task::Poll::Pending
        }
    }
}

#[test]
fn a_sync_listener_observes_the_attempt_before_it_resolves_and_sees_the_outcome() {
    let runtime = fresh_runtime();
    let (on, emit) = create_event_with::<i32>(runtime);
    let async_handler = on.subscribe_async(|n: &i32| {
        let n = *n;
        Box::pin(ready(if n == 0 {
            Err(HaltMarker::new(None))
        } else {
            Ok(n * n)
        }))
    });

    let started: Recorder<()> = Recorder::new();
    let resolved: Recorder<Option<i32>> = Recorder::new();
    let started_r = started.clone();
    let resolved_r = resolved.clone();
    let _sync = create_sync_listener(&async_handler, move |observation| {
        started_r.push(());
        let resolved_r = resolved_r.clone();
        // The executor already drove this future to completion by the time
        // the listener queue runs, so polling the observation here resolves
        // immediately rather than actually suspending.
        let waker = noop_waker();
        let mut cx = std::task::Context::from_waker(&waker);
        let mut observation = observation;
        match std::pin::Pin::new(&mut observation).poll(&mut cx) {
            std::task::Poll::Ready(value) => resolved_r.push(value),
            std::task::Poll::Pending => panic!("observation should already be settled"),
        }
    });

    emit.emit(4);
    assert_eq!(started.snapshot().len(), 1);
    assert_eq!(resolved.snapshot(), vec![Some(16)]);

    emit.emit(0);
    assert_eq!(started.snapshot().len(), 2);
    assert_eq!(resolved.snapshot(), vec![Some(16), None]);
}

fn noop_waker() -> std::task::Waker {
    use std::task::{RawWaker, RawWakerVTable, Waker};
    fn clone(_: *const ()) -> RawWaker {
        raw()
    }
    fn no_op(_: *const ()) {}
    fn raw() -> RawWaker {
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }
    unsafe { Waker::from_raw(raw()) }
}

use std::future::Future as _;
