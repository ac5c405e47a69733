//! # Contract-only scope surface
//!
//! The core assumes but does not define a reactive scope/owner runtime
//! (spec §1, §6): something that opens a disposal scope around a builder and
//! runs registered teardown callbacks when the scope ends. This module is
//! the seam, not the implementation — following the teacher codebase's
//! "contract-only runtime surface" convention, the trait here constrains
//! what callers may depend on without pulling in a specific signal/store
//! runtime.
//!
//! `pulse-core` does ship one concrete implementation, [`LocalScope`],
//! because every subscription `handler(transform)` creates needs *some*
//! scope to register its teardown with, even in a standalone test or a
//! minimal embedding that has no signal-graph runtime of its own. Richer
//! scopes tied into an actual reactive graph belong in a separate crate.

use std::cell::RefCell;
use std::rc::Rc;

/// Host scope runtime contract: register a teardown, or run a closure
/// untracked (without subscribing to ambient reactive sources).
///
/// `pulse-core` itself never calls [`ScopeHook::untrack`] — it has no notion
/// of ambient reactive subscription — but the method is part of the
/// contract because subject-style helpers built on top of this core (out of
/// scope here, spec §1) need it.
pub trait ScopeHook {
    fn on_teardown(&self, f: Box<dyn FnOnce()>);
    fn untrack<R>(&self, f: Box<dyn FnOnce() -> R>) -> R;
}

#[derive(Default)]
struct LocalScopeInner {
    teardowns: RefCell<Vec<Box<dyn FnOnce()>>>,
    disposed: std::cell::Cell<bool>,
}

/// A minimal, real (not mock) [`ScopeHook`] implementation: a teardown list
/// that runs everything registered, in reverse registration order, exactly
/// once, when [`LocalScope::dispose`] is called.
#[derive(Clone, Default)]
pub struct LocalScope {
    inner: Rc<LocalScopeInner>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `builder` with this scope active, then immediately disposes it.
    /// Mirrors `withScope(builder) -> disposer` (spec §6) with disposal
    /// happening eagerly at the end of the call rather than returned to the
    /// caller as a separate handle — the spec's concrete scenarios always
    /// dispose right after building, so this is the common case made
    /// direct; [`LocalScope::new`] plus explicit [`LocalScope::dispose`]
    /// remains available for the deferred-disposal case.
    pub fn with_scope<R>(builder: impl FnOnce(&LocalScope) -> R) -> (R, LocalScope) {
        let scope = LocalScope::new();
        let result = builder(&scope);
        (result, scope)
    }

    /// Runs every registered teardown, in reverse registration order (last
    /// registered, first torn down — mirrors typical drop-stack ordering).
    /// Idempotent: calling twice only tears down once.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let mut teardowns = self.inner.teardowns.borrow_mut();
        while let Some(f) = teardowns.pop() {
            f();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl ScopeHook for LocalScope {
    fn on_teardown(&self, f: Box<dyn FnOnce()>) {
        if self.inner.disposed.get() {
            // Scope already gone: run the teardown immediately rather than
            // leaking it, matching the "no entity outlives its scope"
            // invariant (spec §3).
            f();
            return;
        }
        self.inner.teardowns.borrow_mut().push(f);
    }

    fn untrack<R>(&self, f: Box<dyn FnOnce() -> R>) -> R {
        f()
    }
}
