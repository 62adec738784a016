use serde::{Deserialize, Serialize};

use crate::Command;
use crate::event::DebugEvent;

/// Trait implementing the launching logic of a debugger.
///
/// Both functions are called from the thread that will later drive the debug
/// loop of the returned session, since some platforms bind the debugger role
/// to the calling thread.
pub trait Debugger: Send + 'static {
    /// Debugging session returned by this debugger.
    type Session: DebugSession<Error = Self::Error>;

    /// Handle over the debuggee, usable from any thread.
    type Handle: TargetHandle<Error = Self::Error>;

    /// Error returned by this trait.
    type Error: std::error::Error + OsError + Send + Sync + 'static;

    /// Spawns a process under debug control.
    fn spawn(&mut self, command: Command) -> Result<(Self::Session, Self::Handle), Self::Error>;

    /// Attaches to an already running process.
    fn attach(&mut self, pid: u32) -> Result<(Self::Session, Self::Handle), Self::Error>;
}

/// Trait implementing the event loop primitives of a debugger.
pub trait DebugSession {
    /// Error returned by this trait.
    type Error: std::error::Error;

    /// Returns the process ID of the debuggee.
    fn process_id(&self) -> u32;

    /// Blocks until the next debug event is available.
    ///
    /// The debuggee stays suspended until [resume](Self::resume) is called.
    fn wait_event(&mut self) -> Result<DebugEvent, Self::Error>;

    /// Resumes the debuggee after the last event returned by
    /// [wait_event](Self::wait_event).
    ///
    /// [ContinueDecision::WaitForExplicitContinue] is never passed here.
    fn resume(&mut self, decision: ContinueDecision) -> Result<(), Self::Error>;

    /// Stops debugging the debuggee.
    ///
    /// Called exactly once, when the debug loop exits.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Trait implementing the handle of a debuggee.
///
/// The handle is owned by a single session, which terminates and closes it
/// at most once.
pub trait TargetHandle: Send + 'static {
    /// Error returned by this trait.
    type Error: std::error::Error;

    /// Forcibly terminates the debuggee.
    ///
    /// Terminating an already exited debuggee is not an error.
    fn terminate(&self, exit_code: i32) -> Result<(), Self::Error>;

    /// Closes the handle.
    fn close(self) -> Result<(), Self::Error>;
}

/// Trait for errors carrying an OS error code.
pub trait OsError {
    /// Returns the OS error code, if any.
    fn os_error_code(&self) -> Option<i32>;
}

/// Disposition of a suspended debuggee after a debug event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContinueDecision {
    /// The event was handled, the debuggee continues.
    AutoContinue,

    /// The event (exception) was not handled, it is passed back to the
    /// debuggee.
    NotHandled,

    /// The debuggee stays suspended until an explicit continue is provided.
    WaitForExplicitContinue,
}

impl ContinueDecision {
    /// Returns the decision to resume with when an explicit continue carries
    /// this decision.
    pub const fn explicit(self) -> Self {
        match self {
            Self::NotHandled => Self::NotHandled,
            Self::AutoContinue | Self::WaitForExplicitContinue => Self::AutoContinue,
        }
    }
}
