//! Convenience re-export of the symbols most call sites need. `use
//! pulse_core::prelude::*;` pulls in the event factory, handler, transform
//! helpers, derivations, topic tree, and the scope contract without naming
//! each module.

pub use crate::derivations::{create_listener, create_mutation_listener, create_partition, create_sync_listener};
pub use crate::error::{HaltMarker, PulseError};
pub use crate::event::{create_event, Emitter};
pub use crate::handler::Handler;
pub use crate::halt;
pub use crate::runtime::Runtime;
pub use crate::scope::{LocalScope, ScopeHook};
pub use crate::topic::{create_topic, TopicEmitter, TopicHandler};
pub use crate::transform::{self, Propagated, Transform};
