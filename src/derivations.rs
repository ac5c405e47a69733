//! Derivations built from the handler/scheduler primitives (spec §4.G):
//! `create_partition`, `create_listener`, `create_mutation_listener`, and
//! `create_sync_listener`. None of these add new scheduling machinery —
//! each is a small, specific way of wiring a transform onto an existing
//! handler.

use std::rc::Rc;

use crate::error::HaltMarker;
use crate::handler::{AsyncHandler, Handler, Observation};
use crate::stream::Unsubscribe;
use crate::transform::Propagated;

/// Splits `h` into `(truthy, falsy)` siblings: for each upstream emission,
/// exactly one of the two fires (or neither, if `pred` panics — a panic
/// inside `pred` propagates out of the emitting `flush_queues` call exactly
/// like any other pure-queue panic, per the scheduler's documented
/// not-caught invariant).
pub fn create_partition<E: Clone + 'static>(
    h: &Handler<E>,
    pred: impl Fn(&E) -> bool + 'static,
) -> (Handler<E>, Handler<E>) {
    let pred = Rc::new(pred);
    let pred_for_falsy = pred.clone();

    let truthy = h.subscribe(move |event: &E| -> Propagated<E> {
        if pred(event) {
            Propagated::now(event.clone())
        } else {
            Propagated::halt(HaltMarker::new(None))
        }
    });
    let falsy = h.subscribe(move |event: &E| -> Propagated<E> {
        if pred_for_falsy(event) {
            Propagated::halt(HaltMarker::new(None))
        } else {
            Propagated::now(event.clone())
        }
    });

    (truthy, falsy)
}

/// Runs `effect` after all pure transforms and all mutation effects for the
/// current emission have run (spec §4.G: onto `listenerQueue`).
pub fn create_listener<E: Clone + 'static>(
    h: &Handler<E>,
    effect: impl Fn(E) + 'static,
) -> Unsubscribe<E> {
    let runtime = h.runtime().clone();
    let effect = Rc::new(effect);
    h.stream().subscribe(move |event: &E| {
        let event = event.clone();
        let effect = effect.clone();
        runtime.scheduler().enqueue_listener(move || effect(event));
        runtime.schedule_flush();
    })
}

/// Same as [`create_listener`], but the effect runs on `mutationQueue` —
/// strictly before any listener effect for the same emission.
pub fn create_mutation_listener<E: Clone + 'static>(
    h: &Handler<E>,
    effect: impl Fn(E) + 'static,
) -> Unsubscribe<E> {
    let runtime = h.runtime().clone();
    let effect = Rc::new(effect);
    h.stream().subscribe(move |event: &E| {
        let event = event.clone();
        let effect = effect.clone();
        runtime.scheduler().enqueue_mutation(move || effect(event));
        runtime.schedule_flush();
    })
}

/// Observes an async handler's propagation attempts as they begin, rather
/// than only once they resolve (spec §4.G): `effect` receives an
/// [`Observation`] that resolves to `Some(value)` on success or `None` if
/// the branch halted, letting a caller confirm an async stage was reached
/// without waiting for it.
///
/// `on_async` must come from [`Handler::subscribe_async`] — plain
/// `Handler::subscribe` does not retain the side channel this needs, since
/// Rust handler values cannot grow extra capabilities after construction the
/// way the original spec's callable objects can.
pub fn create_sync_listener<O: Clone + 'static>(
    on_async: &AsyncHandler<O>,
    effect: impl Fn(Observation<O>) + 'static,
) -> Unsubscribe<Observation<O>> {
    let runtime = on_async.handler().runtime().clone();
    let effect = Rc::new(effect);
    on_async.observed().subscribe(move |observation: &Observation<O>| {
        let observation = observation.clone();
        let effect = effect.clone();
        runtime.scheduler().enqueue_listener(move || effect(observation));
        runtime.schedule_flush();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::create_event_with;
    use crate::runtime::Runtime;
    use std::cell::RefCell;

    #[test]
    fn partition_routes_exactly_one_branch_per_emission() {
        let runtime = Runtime::new();
        let (h, emitter) = create_event_with::<i32>(runtime);
        let (evens, odds) = create_partition(&h, |v: &i32| v % 2 == 0);

        let evens_seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let odds_seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let e = evens_seen.clone();
        evens.stream().subscribe(move |v: &i32| e.borrow_mut().push(*v));
        let o = odds_seen.clone();
        odds.stream().subscribe(move |v: &i32| o.borrow_mut().push(*v));

        emitter.emit(2);
        emitter.emit(3);

        assert_eq!(*evens_seen.borrow(), vec![2]);
        assert_eq!(*odds_seen.borrow(), vec![3]);
    }

    #[test]
    fn mutation_listener_runs_before_listener_for_the_same_emission() {
        let runtime = Runtime::new();
        let (h, emitter) = create_event_with::<i32>(runtime);
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let o1 = order.clone();
        let _l = create_listener(&h, move |_v: i32| o1.borrow_mut().push("listener"));
        let o2 = order.clone();
        let _m = create_mutation_listener(&h, move |_v: i32| o2.borrow_mut().push("mutation"));

        emitter.emit(1);

        assert_eq!(*order.borrow(), vec!["mutation", "listener"]);
    }
}
