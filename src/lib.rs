//! Event-composition core: a fine-grained reactive runtime built from a
//! handler graph, a three-queue scheduler, and a hierarchical topic tree.
//!
//! This crate provides the primitives; it does not provide a signal/store
//! runtime, a component model, or a transport layer. Those are concerns for
//! adapter crates built on top of [`ScopeHook`](scope::ScopeHook) and the
//! handler graph defined here.
//!
//! # Layout
//! - [`event`] — [`event::create_event`], the root of every handler graph.
//! - [`handler`] — [`handler::Handler`], the subscribe/propagate primitive.
//! - [`transform`] — the `E -> O | Future<O>` contract a handler subscribes.
//! - [`derivations`] — `create_partition`, `create_listener`,
//!   `create_mutation_listener`, `create_sync_listener`.
//! - [`topic`] — [`topic::create_topic`], hierarchical keyed routing.
//! - [`scope`] — the contract-only scope/teardown surface, plus
//!   [`scope::LocalScope`].
//! - [`runtime`] — [`runtime::Runtime`], the scheduler context.
//! - [`error`] — [`error::PulseError`] and [`error::HaltMarker`].
//! - [`stream`] — the bare multicast primitive handlers are built from.

mod executor;
mod scheduler;

pub mod derivations;
pub mod error;
pub mod event;
pub mod handler;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod stream;
pub mod topic;
pub mod transform;

pub use derivations::{create_listener, create_mutation_listener, create_partition, create_sync_listener};
pub use error::{HaltMarker, PulseError};
pub use event::{create_event, create_event_with, Emitter};
pub use handler::{AsyncHandler, Handler, Observation};
pub use runtime::{ImmediateDriver, MicrotaskDriver, Runtime, RuntimeConfig};
pub use scope::{LocalScope, ScopeHook};
pub use stream::{Stream, Unsubscribe};
pub use topic::{create_topic, create_topic_with, TopicEmitter, TopicHandler};
pub use transform::{Propagated, PulseFuture, Transform};

/// Builds a halted [`Propagated`] carrying `reason`, mirroring `halt()`
/// throwing a `HaltMarker` in the original spec (§4.C) — here, producing the
/// `Err` arm directly rather than unwinding.
pub fn halt<O>(reason: impl Into<std::borrow::Cow<'static, str>>) -> Propagated<O> {
    Propagated::halt(HaltMarker::new(Some(reason.into())))
}
