//! Event factory (spec §4.F): the root of every handler graph.

use crate::handler::Handler;
use crate::runtime::Runtime;
use crate::stream::Stream;

/// Creates a root `(Handler, Emitter)` pair sharing one [`Stream<E>`],
/// wired against the thread-local default [`Runtime`]. Use
/// [`create_event_with`] to attach an explicit runtime instead (isolated
/// tests, multiple independent graphs in one process).
pub fn create_event<E: 'static>() -> (Handler<E>, Emitter<E>) {
    create_event_with(Runtime::current())
}

pub fn create_event_with<E: 'static>(runtime: Runtime) -> (Handler<E>, Emitter<E>) {
    let stream = Stream::new();
    let handler = Handler::new(runtime.clone(), stream.clone());
    let emitter = Emitter { runtime, stream };
    (handler, emitter)
}

/// The push side of an event: feeds values into the handler graph rooted at
/// the paired [`Handler`].
///
/// Emitting enqueues delivery onto the pure queue and requests a flush,
/// rather than delivering inline — matching the handler's own "never inline"
/// delivery discipline (spec §4.E: everything downstream of an emit runs as
/// scheduled queue work, not as a direct call from `emit`).
pub struct Emitter<E> {
    runtime: Runtime,
    stream: Stream<E>,
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            stream: self.stream.clone(),
        }
    }
}

impl<E: 'static> Emitter<E> {
    pub fn emit(&self, value: E) {
        let stream = self.stream.clone();
        self.runtime.scheduler().enqueue_pure(move || stream.push(&value));
        self.runtime.schedule_flush();
    }
}
