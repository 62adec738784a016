use tokio::sync::{Mutex, mpsc};

use crate::event::DebuggerEvent;

/// Producer side of an [EventQueue], owned by the debug loop.
///
/// Pushing never blocks. The queue is closed once the sender is dropped.
pub(crate) struct EventSender(mpsc::UnboundedSender<DebuggerEvent>);

impl EventSender {
    pub fn push(&self, event: DebuggerEvent) {
        if self.0.send(event).is_err() {
            tracing::trace!("event queue dropped");
        }
    }
}

/// FIFO queue of the events of a single session.
pub(crate) struct EventQueue {
    rx: Mutex<mpsc::UnboundedReceiver<DebuggerEvent>>,
}

impl EventQueue {
    pub fn new() -> (EventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSender(tx), Self { rx: Mutex::new(rx) })
    }

    /// Dequeues the next event, parking while the queue is empty.
    ///
    /// Returns `None` once the producer is gone and the queue is drained.
    pub async fn pop(&self) -> Option<DebuggerEvent> {
        self.rx.lock().await.recv().await
    }
}
