//! Handler node: the subscription/propagation primitive every derivation in
//! this crate is built from (spec §4.D).
//!
//! A `Handler<E>` is two things at once, per §9's "callable + stream facet"
//! description: something you subscribe a transform to (producing a new,
//! downstream `Handler<O>`), and a plain [`Stream<E>`] you can tap directly
//! via [`Handler::stream`]. Rust has no callable-with-fields value, so the
//! duality is an inherent method plus an accessor rather than one object
//! with two call shapes.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::executor;
use crate::runtime::Runtime;
use crate::scope::ScopeHook;
use crate::stream::{Stream, Unsubscribe};
use crate::transform::{Propagated, PulseFuture, Transform};

/// A node in the handler graph. Cheap to clone — it is an `Rc`-backed
/// handle over a [`Stream`] plus the [`Runtime`] that owns its queues.
pub struct Handler<E> {
    runtime: Runtime,
    stream: Stream<E>,
    label: Option<Cow<'static, str>>,
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            stream: self.stream.clone(),
            label: self.label.clone(),
        }
    }
}

impl<E: 'static> Handler<E> {
    pub(crate) fn new(runtime: Runtime, stream: Stream<E>) -> Self {
        Self {
            runtime,
            stream,
            label: None,
        }
    }

    /// Attaches a debug label, surfaced in halt-swallow log lines (spec
    /// §4.C: "swallowed (info-logged)" reports the handler's label).
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The stream facet: subscribe directly to raw upstream values without
    /// running them through a transform.
    pub fn stream(&self) -> &Stream<E> {
        &self.stream
    }

    pub(crate) fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Subscribes `transform` to this handler's upstream values, returning a
    /// new downstream `Handler<O>` fed by whatever `transform` produces.
    ///
    /// The transform itself runs synchronously, inline with the upstream
    /// push (it already runs inside a pure-queue task, since every emit path
    /// enqueues rather than calling handlers directly). Delivery to the
    /// *downstream* handler, however, is always re-enqueued onto the pure
    /// queue rather than called inline — including the `Now(Ok(_))` case —
    /// so a long subscriber chain cannot grow the native call stack one
    /// frame per link; instead it grows the pure queue, which the scheduler
    /// already drains iteratively.
    pub fn subscribe<O: 'static>(&self, transform: impl Transform<E, O> + 'static) -> Handler<O> {
        let (downstream, _upstream_sub) = self.subscribe_raw(transform);
        downstream
    }

    /// Like [`subscribe`](Self::subscribe), but registers the upstream
    /// subscription's teardown with `scope`, so the link is severed when the
    /// scope disposes (spec §3: "no entity outlives its scope").
    pub fn subscribe_scoped<O: 'static>(
        &self,
        scope: &impl ScopeHook,
        transform: impl Transform<E, O> + 'static,
    ) -> Handler<O> {
        let (downstream, upstream_sub) = self.subscribe_raw(transform);
        scope.on_teardown(Box::new(move || upstream_sub.unsubscribe()));
        downstream
    }

    fn subscribe_raw<O: 'static>(
        &self,
        transform: impl Transform<E, O> + 'static,
    ) -> (Handler<O>, Unsubscribe<E>) {
        let downstream_stream = Stream::<O>::new();
        let downstream = Handler::new(self.runtime.clone(), downstream_stream.clone());
        let runtime = self.runtime.clone();
        let label = self.label.clone();
        let transform = Rc::new(transform);

        let upstream_sub = self.stream.subscribe(move |event: &E| {
            match transform.invoke(event) {
                Propagated::Now(Ok(value)) => {
                    let runtime = runtime.clone();
                    let downstream_stream = downstream_stream.clone();
                    runtime.scheduler().enqueue_pure(move || downstream_stream.push(&value));
                    runtime.schedule_flush();
                }
                Propagated::Now(Err(halt)) => {
                    log_halt(label.as_deref(), &halt);
                }
                Propagated::Deferred(future) => {
                    let runtime_for_complete = runtime.clone();
                    let downstream_stream = downstream_stream.clone();
                    let label = label.clone();
                    executor::spawn_local(runtime.clone(), future, move |result| match result {
                        Ok(value) => {
                            runtime_for_complete
                                .scheduler()
                                .enqueue_pure(move || downstream_stream.push(&value));
                            runtime_for_complete.schedule_flush();
                        }
                        Err(halt) => log_halt(label.as_deref(), &halt),
                    });
                }
            }
        });

        (downstream, upstream_sub)
    }
}

enum ObservationState<O> {
    Pending(Vec<Waker>),
    Ready(Option<O>),
}

/// A future standing in for "the eventual value of one async transform
/// invocation, or `None` if it halted" (spec §4.G's `createSyncListener`:
/// "effect receives a promise of `E | undefined`"). Unlike the future a
/// transform itself returns, an `Observation` can be cloned and awaited by
/// more than one caller — `create_sync_listener` and ordinary downstream
/// propagation both observe the same resolution.
pub struct Observation<O> {
    inner: Rc<std::cell::RefCell<ObservationState<O>>>,
}

impl<O> Clone for Observation<O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<O> Observation<O> {
    fn pending() -> Self {
        Self {
            inner: Rc::new(std::cell::RefCell::new(ObservationState::Pending(Vec::new()))),
        }
    }

    fn resolve(&self, value: Option<O>) {
        let wakers = {
            let mut state = self.inner.borrow_mut();
            match &mut *state {
                ObservationState::Ready(_) => return,
                ObservationState::Pending(wakers) => std::mem::take(wakers),
            }
        };
        *self.inner.borrow_mut() = ObservationState::Ready(value);
        for waker in wakers {
            waker.wake();
        }
    }
}

impl<O: Clone> Future for Observation<O> {
    type Output = Option<O>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.inner.borrow_mut();
        match &mut *state {
            ObservationState::Ready(value) => Poll::Ready(value.clone()),
            ObservationState::Pending(wakers) => {
                wakers.push(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// The result of [`Handler::subscribe_async`]: a downstream handler plus the
/// side channel `create_sync_listener` taps to observe propagation attempts
/// as they start, rather than only once they resolve.
pub struct AsyncHandler<O> {
    handler: Handler<O>,
    observed: Stream<Observation<O>>,
}

impl<O> AsyncHandler<O> {
    pub fn handler(&self) -> &Handler<O> {
        &self.handler
    }

    pub(crate) fn observed(&self) -> &Stream<Observation<O>> {
        &self.observed
    }
}

impl<E: 'static> Handler<E> {
    /// Subscribes an always-deferred `transform`, returning both the
    /// downstream handler and an [`Observation`] side channel fired
    /// synchronously the moment each propagation begins (spec §4.G:
    /// `createSyncListener` "receives the wrapped-in-promise payload
    /// synchronously at propagation time, before the async transform
    /// resolves").
    pub fn subscribe_async<O: Clone + 'static>(
        &self,
        transform: impl Fn(&E) -> PulseFuture<O> + 'static,
    ) -> AsyncHandler<O> {
        let downstream_stream = Stream::<O>::new();
        let downstream = Handler::new(self.runtime.clone(), downstream_stream.clone());
        let observed = Stream::<Observation<O>>::new();
        let runtime = self.runtime.clone();
        let label = self.label.clone();

        let observed_for_sub = observed.clone();
        self.stream.subscribe(move |event: &E| {
            let observation = Observation::pending();
            observed_for_sub.push(&observation);

            let future = transform(event);
            let runtime_for_complete = runtime.clone();
            let downstream_stream = downstream_stream.clone();
            let label = label.clone();
            let observation_for_complete = observation.clone();
            executor::spawn_local(runtime.clone(), future, move |result| match result {
                Ok(value) => {
                    observation_for_complete.resolve(Some(value.clone()));
                    runtime_for_complete
                        .scheduler()
                        .enqueue_pure(move || downstream_stream.push(&value));
                    runtime_for_complete.schedule_flush();
                }
                Err(halt) => {
                    observation_for_complete.resolve(None);
                    log_halt(label.as_deref(), &halt);
                }
            });
        });

        AsyncHandler {
            handler: downstream,
            observed,
        }
    }
}

fn log_halt(label: Option<&str>, halt: &crate::error::HaltMarker) {
    tracing::info!(
        handler = label.unwrap_or("<unlabeled>"),
        reason = halt.reason().unwrap_or("<none>"),
        "pulse-core: branch halted"
    );
}
