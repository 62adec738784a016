use nix::sys::signal::Signal;
use nix::unistd::Pid;

pub mod debugger;
pub mod session;

/// Debuggee stop reported by the OS.
pub enum DebugStop {
    Exception {
        thread_id: Pid,
        signal: Signal,
        code: i32,
        address: u64,
    },

    ThreadCreated {
        thread_id: Pid,
        new_thread_id: Pid,
    },

    ThreadExited {
        thread_id: Pid,
        exit_code: u32,
    },

    Exited {
        exit_code: u32,
    },
}
