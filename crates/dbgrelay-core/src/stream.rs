use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};

use crate::debugger::Debugger;
use crate::event::DebuggerEvent;
use crate::registry::SessionRegistry;

/// Opens the event stream of the session registered at `index`.
///
/// If there is no such session, the stream yields a single
/// [NotFound](DebuggerEvent::NotFound) event. Otherwise it yields the
/// session's events in order, and ends once the debug loop is over and the
/// queue is drained. Dropping the stream stops the consumption.
pub fn open_stream<D: Debugger>(
    registry: &SessionRegistry<D>,
    index: usize,
) -> BoxStream<'static, DebuggerEvent> {
    match registry.lookup(index) {
        Some(session) => {
            tracing::debug!(index, pid = session.process_id(), "event stream opened");
            session.events().boxed()
        }
        None => {
            tracing::debug!(index, "event stream on unknown session");

            stream::iter([DebuggerEvent::not_found(index)]).boxed()
        }
    }
}
