use dbgrelay_core::debugger::OsError;
use nix::sys::wait::WaitStatus;

/// Error returned by the Linux debugger.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O error (e.g., process spawn failure).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected wait status while setting up the debuggee.
    #[error("bad child wait status: {0:?}")]
    BadChildWait(WaitStatus),

    /// Failed system call.
    #[error("os error: {0}")]
    Os(#[from] nix::Error),

    /// Failed `pidfd_open`.
    #[error("pidfd_open: {0}")]
    Pidfd(nix::Error),
}

impl OsError for Error {
    fn os_error_code(&self) -> Option<i32> {
        match self {
            Self::Io(e) => e.raw_os_error(),
            Self::Os(e) | Self::Pidfd(e) => Some(*e as i32),
            Self::BadChildWait(_) => None,
        }
    }
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
