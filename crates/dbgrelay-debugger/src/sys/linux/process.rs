use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use dbgrelay_core::debugger::TargetHandle;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::unistd::Pid;

/// Handle over a traced process, backed by a pidfd.
///
/// The pidfd keeps designating the debuggee even after its PID is recycled,
/// so terminating through it never hits an unrelated process.
pub struct ProcessHandle {
    pidfd: OwnedFd,
    pid: Pid,
}

impl ProcessHandle {
    /// Opens a handle over the process with the given ID.
    pub fn open(pid: Pid) -> crate::sys::Result<Self> {
        let fd = unsafe { nix::libc::syscall(nix::libc::SYS_pidfd_open, pid.as_raw(), 0) };
        let fd = Errno::result(fd).map_err(crate::sys::Error::Pidfd)?;

        // SAFETY: `pidfd_open` returned a new file descriptor we now own.
        let pidfd = unsafe { OwnedFd::from_raw_fd(fd as RawFd) };

        Ok(Self { pidfd, pid })
    }

    /// Returns the process ID of the process associated with this handle.
    pub const fn id(&self) -> Pid {
        self.pid
    }

    /// Returns the raw pidfd.
    pub fn as_raw_fd(&self) -> RawFd {
        self.pidfd.as_raw_fd()
    }
}

impl TargetHandle for ProcessHandle {
    type Error = crate::sys::Error;

    /// Kills the debuggee with `SIGKILL`, so `exit_code` is ignored.
    fn terminate(&self, _exit_code: i32) -> Result<(), Self::Error> {
        let res = unsafe {
            Errno::result(nix::libc::syscall(
                nix::libc::SYS_pidfd_send_signal,
                self.pidfd.as_raw_fd(),
                Signal::SIGKILL as nix::libc::c_int,
                std::ptr::null::<nix::libc::siginfo_t>(),
                0,
            ))
        };

        match res {
            Ok(_) => {
                tracing::debug!(pid = self.pid.as_raw(), "process killed");
                Ok(())
            }
            Err(Errno::ESRCH) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, pidfd = self.pidfd.as_raw_fd(), "pidfd_send_signal");
                Err(e.into())
            }
        }
    }

    fn close(self) -> Result<(), Self::Error> {
        nix::unistd::close(self.pidfd.into_raw_fd())?;
        Ok(())
    }
}
