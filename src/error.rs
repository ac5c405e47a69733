//! Error taxonomy for the event-composition core.
//!
//! # Design background
//! Three kinds of failure can come out of a handler's transform: an
//! intentional halt (control flow, not a fault), a genuine transform error
//! (must surface to the caller or the downstream promise), and a listener or
//! mutation effect panicking mid-drain (documented limitation: the rest of
//! that queue is left unrun). `PulseError` gives each of these a stable,
//! matchable shape instead of a bare `Box<dyn Error>`, mirroring the
//! "stable error code, no silent swallowing" discipline the surrounding
//! ecosystem applies to its own core error types.
use std::borrow::Cow;

/// The distinguished value produced by [`crate::halt`]. Carries an optional
/// human-readable reason; flows through promise chains as an in-band value
/// rather than a rejection so it can be distinguished from genuine async
/// errors (spec §4.C).
#[derive(Debug, Clone)]
pub struct HaltMarker {
    reason: Option<Cow<'static, str>>,
}

impl HaltMarker {
    pub fn new(reason: Option<Cow<'static, str>>) -> Self {
        Self { reason }
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl std::fmt::Display for HaltMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "halted: {reason}"),
            None => write!(f, "halted"),
        }
    }
}

/// Crate-wide error type for failures that are *not* halts.
///
/// Halts never become a `PulseError` — they are represented separately as
/// [`HaltMarker`] and handled entirely within [`crate::transform::Propagated`]
/// and the handler subscription path. `PulseError` exists for the other two
/// error kinds §7 of the spec names: a transform raising something other
/// than a halt, and a listener/mutation effect panicking during a drain.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// A transform's closure returned an error that was not a halt. This is
    /// re-thrown out of the originating emit call (sync path) or left to
    /// reject the downstream future (async path); the core never swallows it.
    #[error("transform failed: {0}")]
    Transform(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A listener or mutation effect panicked while a queue was draining.
    /// Per spec §7 this is a documented limitation: the remaining work on
    /// that queue for the current drain is left unrun.
    #[error("listener effect panicked mid-drain: {0}")]
    ListenerPanicked(Cow<'static, str>),
}

impl PulseError {
    pub fn transform(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        PulseError::Transform(Box::new(cause))
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;
