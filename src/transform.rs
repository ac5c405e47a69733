//! Transform contract and the propagation value a transform produces (spec
//! §4.B, §4.C).
//!
//! A handler's transform is the single place user logic plugs into the
//! graph. It receives the upstream value and either produces a value now, a
//! value later (an async transform, flattened through the promise machinery
//! rather than nested), or halts the branch.

use std::future::Future;
use std::pin::Pin;

use crate::error::HaltMarker;

/// A boxed, type-erased future, used wherever an async transform's result
/// needs to be stored or passed around without naming its concrete future
/// type.
pub type PulseFuture<O> = Pin<Box<dyn Future<Output = Result<O, HaltMarker>>>>;

/// What a transform produced for a single upstream value (spec §4.C):
/// either ready immediately, or deferred behind a future that resolves to
/// the eventual value. `Halt` is folded into the `Err` arm of the inner
/// `Result` rather than kept as a third enum variant — see
/// SPEC_FULL.md's REDESIGN FLAGS for why halts are modeled as `Result::Err`
/// instead of a thrown/caught marker.
pub enum Propagated<O> {
    Now(Result<O, HaltMarker>),
    Deferred(PulseFuture<O>),
}

impl<O> Propagated<O> {
    pub fn now(value: O) -> Self {
        Propagated::Now(Ok(value))
    }

    pub fn halt(marker: HaltMarker) -> Self {
        Propagated::Now(Err(marker))
    }

    pub fn deferred(future: PulseFuture<O>) -> Self {
        Propagated::Deferred(future)
    }
}

/// A handler's transform: consumes the upstream event and produces a
/// [`Propagated`] result.
///
/// Implemented for any `Fn(&E) -> Propagated<O>` closure so callers almost
/// never need to name this trait directly; it exists so `Handler::subscribe`
/// has a bound to state rather than taking an opaque closure type, matching
/// the way the reference codebase names trait seams at points where more
/// than one kind of caller (sync closures here, generated code elsewhere)
/// needs to satisfy the same contract.
pub trait Transform<E, O> {
    fn invoke(&self, event: &E) -> Propagated<O>;
}

impl<E, O, F> Transform<E, O> for F
where
    F: Fn(&E) -> Propagated<O>,
{
    fn invoke(&self, event: &E) -> Propagated<O> {
        self(event)
    }
}

/// Convenience constructor for a synchronous transform that never halts —
/// the common case (spec §4.B's "plain mapping" example).
pub fn sync<E, O>(f: impl Fn(&E) -> O + 'static) -> impl Fn(&E) -> Propagated<O> {
    move |event: &E| Propagated::now(f(event))
}

/// Convenience constructor for an async transform: wraps a closure that
/// produces a future of `Result<O, HaltMarker>` into a [`Transform`] that
/// always returns [`Propagated::Deferred`] (spec §9's "overload-shaped
/// constructors" guidance for the `E -> O | Promise<O>` union).
pub fn async_fn<E, O, Fut>(f: impl Fn(&E) -> Fut + 'static) -> impl Fn(&E) -> Propagated<O>
where
    Fut: Future<Output = Result<O, HaltMarker>> + 'static,
{
    move |event: &E| Propagated::deferred(Box::pin(f(event)))
}
