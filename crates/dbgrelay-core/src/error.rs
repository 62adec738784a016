use std::path::PathBuf;

/// Error type of this crate, generic over the debugger error.
#[derive(thiserror::Error, Debug)]
pub enum Error<E> {
    /// The debuggee could not be spawned.
    #[error("cannot launch {}: {source}", program.display())]
    Launch {
        /// Program that failed to launch.
        program: PathBuf,

        /// OS error code.
        code: Option<i32>,

        /// Debugger error.
        source: E,
    },

    /// The debugger could not attach to the process.
    #[error("cannot attach to process {pid}: {source}")]
    Attach {
        /// ID of the process.
        pid: u32,

        /// OS error code.
        code: Option<i32>,

        /// Debugger error.
        source: E,
    },

    /// The debug loop thread could not start, or exited before reporting the
    /// launch result.
    #[error("debug loop exited before launching the debuggee")]
    LoopVanished,

    /// An explicit continue was sent to a session whose debug loop is gone.
    #[error("debug loop is not running")]
    LoopNotRunning,
}

impl<E> Error<E> {
    /// Returns the OS error code of a launch or attach failure.
    pub const fn os_error_code(&self) -> Option<i32> {
        match self {
            Self::Launch { code, .. } | Self::Attach { code, .. } => *code,
            Self::LoopVanished | Self::LoopNotRunning => None,
        }
    }
}

/// Result type of this crate.
pub type Result<T, E> = core::result::Result<T, Error<E>>;
