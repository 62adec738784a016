use tokio::sync::{mpsc, watch};

use super::SessionState;
use super::queue::EventSender;
use crate::debugger::{ContinueDecision, DebugSession};
use crate::dispatch::{Dispatched, Dispatcher};
use crate::event::DebuggerEvent;
use crate::handler::EventHandler;

/// Debug loop of a session, running on the thread that launched the
/// debuggee.
pub(super) struct DebugLoop<S: DebugSession, H> {
    guard: LoopGuard<S>,
    dispatcher: Dispatcher<H>,
    continue_rx: mpsc::UnboundedReceiver<ContinueDecision>,
}

impl<S, H> DebugLoop<S, H>
where
    S: DebugSession,
    H: EventHandler,
{
    pub fn new(
        session: S,
        handler: H,
        events: EventSender,
        state: watch::Sender<SessionState>,
        continue_rx: mpsc::UnboundedReceiver<ContinueDecision>,
    ) -> Self {
        let dispatcher = Dispatcher::new(session.process_id(), handler);

        Self {
            guard: LoopGuard {
                session,
                events,
                state,
                outcome: None,
            },
            dispatcher,
            continue_rx,
        }
    }

    /// Runs the loop until the debuggee exits or a debugger call fails.
    #[tracing::instrument(name = "DebugLoop", skip_all, fields(pid = self.dispatcher.process_id()))]
    pub fn run(mut self) {
        self.guard.state.send_replace(SessionState::Running);

        let outcome = self.drive().map_err(|e| e.to_string());

        match outcome {
            Ok(exit_code) => tracing::info!(exit_code, "debuggee has exited"),
            Err(ref e) => tracing::error!(error = %e, "debug loop failed"),
        }

        self.guard.outcome = Some(outcome);
    }

    fn drive(&mut self) -> Result<u32, S::Error> {
        let session = &mut self.guard.session;

        loop {
            let event = session.wait_event()?;

            let Dispatched {
                decision,
                event,
                exit_code,
            } = self.dispatcher.dispatch(event);

            if decision == ContinueDecision::WaitForExplicitContinue {
                // continues sent before the event is visible to consumers are stale
                while self.continue_rx.try_recv().is_ok() {}
            }

            if let Some(event) = event {
                tracing::trace!(kind = event.info.kind().map(|k| k.name()), "event");
                self.guard.events.push(DebuggerEvent::Debug(event));
            }

            let decision = match decision {
                ContinueDecision::WaitForExplicitContinue => {
                    tracing::debug!("waiting for explicit continue");

                    self.continue_rx
                        .blocking_recv()
                        .map_or(ContinueDecision::AutoContinue, ContinueDecision::explicit)
                }
                decision => decision,
            };

            session.resume(decision)?;

            if let Some(exit_code) = exit_code {
                break Ok(exit_code);
            }
        }
    }
}

/// Guard stopping the debugger and publishing the loop outcome, whichever
/// way the loop exits.
struct LoopGuard<S: DebugSession> {
    session: S,
    events: EventSender,
    state: watch::Sender<SessionState>,

    /// Exit code, or failure message. `None` if the loop panicked.
    outcome: Option<Result<u32, String>>,
}

impl<S: DebugSession> Drop for LoopGuard<S> {
    fn drop(&mut self) {
        if let Err(e) = self.session.stop() {
            tracing::warn!(error = %e, "stop debugging");
        }

        let state = match self.outcome.take() {
            Some(Ok(_)) => SessionState::Terminated,
            Some(Err(e)) => {
                self.events
                    .push(DebuggerEvent::Error(format!("debug loop failed: {e}")));
                SessionState::TerminatedWithError
            }
            None => {
                self.events
                    .push(DebuggerEvent::Error("debug loop panicked".to_owned()));
                SessionState::TerminatedWithError
            }
        };

        self.state.send_replace(state);
    }
}
