use dbgrelay_core::Command;
use nix::unistd::Pid;

use super::session::Session;
use crate::sys::{self, ProcessHandle};

/// Default debugger (local debugging) implementation.
///
/// # Note
///
/// Right now, only **Linux** is supported.
#[derive(Debug, Default, Clone, Copy)]
pub struct Debugger;

impl Debugger {
    /// Creates a new debugger.
    pub const fn new() -> Self {
        Self
    }
}

impl dbgrelay_core::debugger::Debugger for Debugger {
    type Session = Session;
    type Handle = ProcessHandle;
    type Error = crate::Error;

    fn spawn(&mut self, command: Command) -> Result<(Self::Session, Self::Handle), Self::Error> {
        let pid = sys::spawn_debuggee(&command)?;

        let handle = match ProcessHandle::open(pid) {
            Ok(handle) => handle,
            Err(e) => {
                // the child is still suspended and would never be reaped
                let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL);
                let _ = nix::sys::wait::waitpid(pid, None);
                return Err(e);
            }
        };

        tracing::debug!(pid = pid.as_raw(), "debuggee spawned");

        Ok((Session::new(&handle, false), handle))
    }

    fn attach(&mut self, pid: u32) -> Result<(Self::Session, Self::Handle), Self::Error> {
        let pid = Pid::from_raw(pid as i32);

        let handle = ProcessHandle::open(pid)?;
        sys::attach_debuggee(pid)?;

        tracing::debug!(pid = pid.as_raw(), "debuggee attached");

        Ok((Session::new(&handle, true), handle))
    }
}
