mod error;
mod process;
mod session;

use std::io;
use std::os::unix::process::CommandExt;

use dbgrelay_core::Command;
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

pub use self::error::{Error, Result};
pub use self::process::ProcessHandle;
pub(crate) use self::session::{ThreadSet, entry_point, image_base, wait_for_debug_stop};

/// Spawns a new child process.
///
/// # Note
///
/// The process is spawned in debug-mode, and is suspended on its first
/// instruction when this function returns.
// the child is reaped through `waitpid` by the debug loop
#[allow(clippy::zombie_processes)]
pub fn spawn_debuggee(command: &Command) -> crate::sys::Result<Pid> {
    let mut cmd = std::process::Command::new(&command.program);
    cmd.args(&command.args);

    if let Some(env) = command.env.resolve() {
        cmd.env_clear().envs(env);
    }

    if let Some(ref dir) = command.current_dir {
        cmd.current_dir(dir);
    }

    // On Linux, if a `pre_exec` closure is specified, `rust-std` will
    // spawn the process with `fork`+`exec`, otherwise `posix_spawn` is used.
    unsafe {
        cmd.pre_exec(|| ptrace::traceme().map_err(|e| io::Error::from_raw_os_error(e as i32)))
    };

    let child = cmd.spawn()?;
    let pid = Pid::from_raw(child.id() as i32);

    wait_for_thread_ready(pid, Signal::SIGTRAP)?;

    Ok(pid)
}

/// Attaches to a running process.
///
/// The main thread is suspended when this function returns.
pub fn attach_debuggee(pid: Pid) -> crate::sys::Result<()> {
    ptrace::attach(pid)?;

    if let Err(e) = wait_for_thread_ready(pid, Signal::SIGSTOP) {
        let _ = ptrace::detach(pid, None);
        return Err(e);
    }

    Ok(())
}

fn wait_for_thread_ready(pid: Pid, signal: Signal) -> crate::sys::Result<()> {
    let status = waitpid(pid, Some(WaitPidFlag::__WALL))?;

    if status != WaitStatus::Stopped(pid, signal) {
        return Err(crate::sys::Error::BadChildWait(status));
    }

    ptrace::setoptions(
        pid,
        ptrace::Options::PTRACE_O_TRACECLONE | ptrace::Options::PTRACE_O_TRACEEXIT,
    )?;

    Ok(())
}
