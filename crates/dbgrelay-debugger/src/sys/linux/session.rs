use std::collections::HashSet;
use std::path::Path;

use nix::errno::Errno;
use nix::libc::{AT_ENTRY, AT_NULL, PTRACE_EVENT_CLONE, PTRACE_EVENT_EXIT};
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::common::DebugStop;

/// Threads known to the debugger, beyond the main thread.
#[derive(Default)]
pub(crate) struct ThreadSet {
    /// Threads reported as created.
    known: HashSet<Pid>,

    /// New threads whose initial stop was reported before their clone event.
    early_stops: HashSet<Pid>,
}

/// Waits for the next debug stop of the debuggee whose main thread is `main`.
///
/// Stops which are not reportable (exit of the main thread before the
/// process exits, exit of a thread already waited for) are resumed here.
pub(crate) fn wait_for_debug_stop(
    main: Pid,
    threads: &mut ThreadSet,
) -> crate::sys::Result<DebugStop> {
    loop {
        let status = waitpid(None, Some(WaitPidFlag::__WALL | WaitPidFlag::__WNOTHREAD))?;

        let stop = match status {
            WaitStatus::Stopped(tid, Signal::SIGSTOP)
                if tid != main && !threads.known.contains(&tid) =>
            {
                // released on its clone event
                threads.early_stops.insert(tid);
                continue;
            }
            WaitStatus::Stopped(tid, signal) => {
                let (code, address) = match ptrace::getsiginfo(tid) {
                    Ok(info) if is_fault(signal, info.si_code) => {
                        (info.si_code, unsafe { info.si_addr() } as u64)
                    }
                    Ok(info) => (info.si_code, 0),
                    Err(Errno::EINVAL) => {
                        // group-stop of a stop signal passed back to the
                        // debuggee: the thread stays stopped
                        tracing::debug!(tid = tid.as_raw(), %signal, "group-stop");
                        continue;
                    }
                    Err(_) => (0, 0),
                };

                DebugStop::Exception {
                    thread_id: tid,
                    signal,
                    code,
                    address,
                }
            }
            WaitStatus::PtraceEvent(tid, Signal::SIGTRAP, PTRACE_EVENT_CLONE) => {
                let new_tid = ptrace::getevent(tid).map(|id| Pid::from_raw(id as i32))?;

                if !threads.early_stops.remove(&new_tid) {
                    match waitpid(new_tid, Some(WaitPidFlag::__WALL))? {
                        WaitStatus::Stopped(_, Signal::SIGSTOP) => (),
                        status => return Err(crate::sys::Error::BadChildWait(status)),
                    }
                }

                if !Path::new(&format!("/proc/{main}/task/{new_tid}")).exists() {
                    // cloned process, not a thread of the debuggee
                    ptrace::detach(new_tid, None)?;
                    cont(tid)?;
                    continue;
                }

                threads.known.insert(new_tid);
                cont(new_tid)?;

                DebugStop::ThreadCreated {
                    thread_id: tid,
                    new_thread_id: new_tid,
                }
            }
            WaitStatus::PtraceEvent(tid, Signal::SIGTRAP, PTRACE_EVENT_EXIT) => {
                if tid == main {
                    // reported on process exit instead
                    cont(tid)?;
                    continue;
                }

                // the thread is gone already if the process was killed
                let status = ptrace::getevent(tid).unwrap_or(nix::libc::SIGKILL.into());

                DebugStop::ThreadExited {
                    thread_id: tid,
                    exit_code: exit_code_from_status(status as i32),
                }
            }
            WaitStatus::PtraceEvent(tid, _, event) => {
                tracing::debug!(tid = tid.as_raw(), event, "ignored ptrace event");
                cont(tid)?;
                continue;
            }
            WaitStatus::Exited(pid, exit_code) => {
                if pid != main {
                    threads.known.remove(&pid);
                    continue;
                }

                DebugStop::Exited {
                    exit_code: exit_code as u32,
                }
            }
            WaitStatus::Signaled(pid, signal, _) => {
                if pid != main {
                    threads.known.remove(&pid);
                    continue;
                }

                DebugStop::Exited {
                    exit_code: 128 + signal as u32,
                }
            }
            _ => return Err(crate::sys::Error::BadChildWait(status)),
        };

        break Ok(stop);
    }
}

/// Resumes a thread which may have been killed meanwhile.
fn cont(tid: Pid) -> crate::sys::Result<()> {
    match ptrace::cont(tid, None) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Returns whether `signal` was raised by a fault, in which case its
/// `si_addr` is the faulting address.
fn is_fault(signal: Signal, si_code: i32) -> bool {
    // `si_code <= 0` for signals sent by `kill`, `sigqueue`, `tgkill`...
    si_code > 0
        && matches!(
            signal,
            Signal::SIGSEGV | Signal::SIGBUS | Signal::SIGILL | Signal::SIGFPE | Signal::SIGTRAP
        )
}

/// Decodes the wait status reported by `PTRACE_EVENT_EXIT`.
fn exit_code_from_status(status: i32) -> u32 {
    match status & 0x7f {
        0 => ((status >> 8) & 0xff) as u32,
        signal => 128 + signal as u32,
    }
}

/// Returns the address where the executable of `pid` is mapped, or 0 if it
/// cannot be found.
pub(crate) fn image_base(pid: Pid) -> u64 {
    let exe = match std::fs::read_link(format!("/proc/{pid}/exe")) {
        Ok(exe) => exe,
        Err(e) => {
            tracing::debug!(error = %e, "cannot resolve debuggee executable");
            return 0;
        }
    };

    let maps = match std::fs::read_to_string(format!("/proc/{pid}/maps")) {
        Ok(maps) => maps,
        Err(e) => {
            tracing::debug!(error = %e, "cannot read debuggee mappings");
            return 0;
        }
    };

    maps.lines()
        .find(|line| {
            line.split_whitespace()
                .nth(5)
                .is_some_and(|path| Path::new(path) == exe)
        })
        .and_then(|line| line.split('-').next())
        .and_then(|start| u64::from_str_radix(start, 16).ok())
        .unwrap_or_default()
}

/// Returns the entry point of `pid`, or 0 if it cannot be found.
pub(crate) fn entry_point(pid: Pid) -> u64 {
    const WORD: usize = std::mem::size_of::<usize>();

    let auxv = match std::fs::read(format!("/proc/{pid}/auxv")) {
        Ok(auxv) => auxv,
        Err(e) => {
            tracing::debug!(error = %e, "cannot read debuggee auxv");
            return 0;
        }
    };

    let word = |bytes: &[u8]| {
        let mut buf = [0; WORD];
        buf.copy_from_slice(bytes);
        usize::from_ne_bytes(buf) as u64
    };

    auxv.chunks_exact(WORD * 2)
        .map(|entry| (word(&entry[..WORD]), word(&entry[WORD..])))
        .take_while(|(ty, _)| *ty != AT_NULL as u64)
        .find(|(ty, _)| *ty == AT_ENTRY as u64)
        .map(|(_, val)| val)
        .unwrap_or_default()
}
