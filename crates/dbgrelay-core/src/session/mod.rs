mod debug_loop;
mod queue;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use futures_util::Stream;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};

use self::debug_loop::DebugLoop;
use self::queue::EventQueue;
use crate::Command;
use crate::debugger::{ContinueDecision, DebugSession, Debugger, OsError, TargetHandle};
use crate::error::Error;
use crate::event::DebuggerEvent;
use crate::handler::EventHandler;

/// Lifecycle state of a [DebuggerSession].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// The debuggee is being launched.
    Starting,

    /// The debug loop is running.
    Running,

    /// The debuggee has exited.
    Terminated,

    /// The debug loop failed.
    TerminatedWithError,
}

impl SessionState {
    /// Returns whether the debug loop is over.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::TerminatedWithError)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => f.write_str("starting"),
            Self::Running => f.write_str("running"),
            Self::Terminated => f.write_str("terminated"),
            Self::TerminatedWithError => f.write_str("terminated with error"),
        }
    }
}

/// Debugging session over a single debuggee.
///
/// The debug loop runs on a dedicated thread from creation until the
/// debuggee exits, the loop fails, or the session is [released](Self::release).
/// Events produced by the loop are queued in order until consumed with
/// [next_event](Self::next_event) or [events](Self::events).
pub struct DebuggerSession<D: Debugger> {
    process_id: u32,

    /// Debuggee handle, `None` once released.
    target: Mutex<Option<D::Handle>>,

    state: watch::Receiver<SessionState>,

    events: EventQueue,

    /// Explicit continue channel, `None` once released.
    continue_tx: Mutex<Option<mpsc::UnboundedSender<ContinueDecision>>>,

    /// Debug loop thread, `None` once joined.
    debug_loop: Mutex<Option<JoinHandle<()>>>,
}

impl<D: Debugger> DebuggerSession<D> {
    /// Spawns a process under debug control and starts its debug loop.
    #[tracing::instrument(name = "Spawn", skip_all, fields(%command))]
    pub async fn spawn<H: EventHandler>(
        mut debugger: D,
        command: Command,
        handler: H,
    ) -> crate::Result<Self, D::Error> {
        let program = command.program.clone();

        Self::launch(move || debugger.spawn(command), handler)
            .await
            .map_err(|e| {
                e.into_error(|source| Error::Launch {
                    program,
                    code: source.os_error_code(),
                    source,
                })
            })
    }

    /// Attaches to a running process and starts its debug loop.
    #[tracing::instrument(name = "Attach", skip(debugger, handler))]
    pub async fn attach<H: EventHandler>(
        mut debugger: D,
        pid: u32,
        handler: H,
    ) -> crate::Result<Self, D::Error> {
        Self::launch(move || debugger.attach(pid), handler)
            .await
            .map_err(|e| {
                e.into_error(|source| Error::Attach {
                    pid,
                    code: source.os_error_code(),
                    source,
                })
            })
    }

    async fn launch<F, H>(launcher: F, handler: H) -> Result<Self, LaunchFailure<D::Error>>
    where
        F: FnOnce() -> Result<(D::Session, D::Handle), D::Error> + Send + 'static,
        H: EventHandler,
    {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (state_tx, state) = watch::channel(SessionState::Starting);
        let (events_tx, events) = EventQueue::new();
        let (continue_tx, continue_rx) = mpsc::unbounded_channel();

        let debug_loop = thread::Builder::new()
            .name("dbgrelay-loop".to_owned())
            .spawn(move || {
                let (session, handle) = match launcher() {
                    Ok(launched) => launched,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let process_id = session.process_id();
                let debug_loop = DebugLoop::new(session, handler, events_tx, state_tx, continue_rx);

                if let Err(Ok((_, handle))) = ready_tx.send(Ok((process_id, handle))) {
                    tracing::warn!(pid = process_id, "launch abandoned, killing debuggee");
                    release_target(handle);
                }

                debug_loop.run();
            })
            .map_err(|e| {
                tracing::error!(error = %e, "debug loop thread");
                LaunchFailure::LoopVanished
            })?;

        let (process_id, handle) = match ready_rx.await {
            Ok(Ok(launched)) => launched,
            Ok(Err(e)) => return Err(LaunchFailure::Debugger(e)),
            Err(_) => return Err(LaunchFailure::LoopVanished),
        };

        tracing::info!(pid = process_id, "debug loop started");

        Ok(Self {
            process_id,
            target: Mutex::new(Some(handle)),
            state,
            events,
            continue_tx: Mutex::new(Some(continue_tx)),
            debug_loop: Mutex::new(Some(debug_loop)),
        })
    }

    /// Returns the process ID of the debuggee.
    pub const fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Returns the current state of the session.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Returns a receiver notified on every state change.
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits until the debug loop is over, and returns the final state.
    pub async fn wait_terminated(&self) -> SessionState {
        let mut changes = self.state.clone();

        let state = match changes.wait_for(|s| s.is_terminal()).await {
            Ok(s) => *s,
            // the loop thread is gone without publishing a final state
            Err(_) => SessionState::TerminatedWithError,
        };

        state
    }

    /// Resumes a debuggee kept suspended by a handler which returned
    /// [WaitForExplicitContinue](ContinueDecision::WaitForExplicitContinue).
    ///
    /// [NotHandled](ContinueDecision::NotHandled) passes the exception back
    /// to the debuggee, any other decision continues.
    pub fn continue_with(&self, decision: ContinueDecision) -> crate::Result<(), D::Error> {
        let continue_tx = lock(&self.continue_tx);

        continue_tx
            .as_ref()
            .filter(|_| !self.state().is_terminal())
            .and_then(|tx| tx.send(decision).ok())
            .ok_or(Error::LoopNotRunning)
    }

    /// Dequeues the next event, waiting for one if the queue is empty.
    ///
    /// Returns `None` once the debug loop is over and every event has been
    /// dequeued.
    pub async fn next_event(&self) -> Option<DebuggerEvent> {
        self.events.pop().await
    }

    /// Returns a stream over the session's events, in the order they were
    /// produced.
    ///
    /// Events are dequeued as the stream is polled: concurrent streams over
    /// the same session share the events between them.
    pub fn events(self: Arc<Self>) -> impl Stream<Item = DebuggerEvent> + Send + 'static {
        futures_util::stream::unfold(self, |session| async move {
            let event = session.next_event().await?;
            Some((event, session))
        })
    }

    /// Terminates the debuggee, closes its handle and joins the debug loop.
    ///
    /// Calling this function more than once is a no-op. Failures are logged
    /// and never returned.
    #[tracing::instrument(name = "Release", skip(self), fields(pid = self.process_id))]
    pub async fn release(&self) {
        let Some(target) = lock(&self.target).take() else {
            tracing::debug!("session already released");
            return;
        };

        release_target(target);

        // unblocks a loop waiting for an explicit continue
        lock(&self.continue_tx).take();

        let Some(debug_loop) = lock(&self.debug_loop).take() else {
            return;
        };

        match tokio::task::spawn_blocking(move || debug_loop.join()).await {
            Ok(Ok(())) => tracing::debug!("debug loop joined"),
            Ok(Err(_)) => tracing::warn!("debug loop panicked"),
            Err(e) => tracing::warn!(error = %e, "debug loop join"),
        }
    }
}

impl<D: Debugger> Drop for DebuggerSession<D> {
    fn drop(&mut self) {
        let target = self
            .target
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(target) = target {
            tracing::debug!(pid = self.process_id, "session dropped before release");
            release_target(target);
        }
    }
}

fn release_target<H: TargetHandle>(target: H) {
    if let Err(e) = target.terminate(0) {
        tracing::warn!(error = %e, "terminate debuggee");
    }

    if let Err(e) = target.close() {
        tracing::warn!(error = %e, "close debuggee handle");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum LaunchFailure<E> {
    Debugger(E),
    LoopVanished,
}

impl<E> LaunchFailure<E> {
    fn into_error(self, f: impl FnOnce(E) -> Error<E>) -> Error<E> {
        match self {
            Self::Debugger(e) => f(e),
            Self::LoopVanished => Error::LoopVanished,
        }
    }
}
