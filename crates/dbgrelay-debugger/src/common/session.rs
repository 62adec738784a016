use dbgrelay_core::debugger::{ContinueDecision, DebugSession};
use dbgrelay_core::event::{
    CreateProcessInfo, CreateThreadInfo, DebugEvent, DebugEventInfo, ExceptionInfo,
};
use nix::errno::Errno;
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::unistd::Pid;

use super::DebugStop;
use crate::sys::{self, ProcessHandle, ThreadSet};

/// Debugging session over a local process.
pub struct Session {
    pid: Pid,

    /// Raw pidfd of the debuggee, reported as its process handle.
    pidfd: u64,

    /// Whether the debuggee was attached to (rather than spawned).
    attached: bool,

    threads: ThreadSet,

    progress: Progress,
}

/// Where the debuggee is at, from the debugger's point of view.
enum Progress {
    /// The initial stop is not reported yet.
    Starting,

    /// A thread is stopped, with the signal it would receive on resume.
    Stopped {
        thread_id: Pid,
        signal: Option<Signal>,
    },

    Running,

    Exited,
}

impl Session {
    pub(crate) fn new(handle: &ProcessHandle, attached: bool) -> Self {
        Self {
            pid: handle.id(),
            pidfd: handle.as_raw_fd() as u64,
            attached,
            threads: ThreadSet::default(),
            progress: Progress::Starting,
        }
    }

    fn create_process_event(&self) -> DebugEventInfo {
        DebugEventInfo::CreateProcess(CreateProcessInfo {
            file_handle: 0,
            process_handle: self.pidfd,
            thread_handle: 0,
            base_of_image: sys::image_base(self.pid),
            debug_info_file_offset: 0,
            debug_info_size: 0,
            thread_local_base: 0,
            start_address: sys::entry_point(self.pid),
            image_name: 0,
            unicode: false,
        })
    }

    fn event(&self, thread_id: Pid, info: DebugEventInfo) -> DebugEvent {
        DebugEvent {
            process_id: self.pid.as_raw() as u32,
            thread_id: thread_id.as_raw() as u32,
            info,
        }
    }
}

impl DebugSession for Session {
    type Error = crate::Error;

    fn process_id(&self) -> u32 {
        self.pid.as_raw() as u32
    }

    fn wait_event(&mut self) -> Result<DebugEvent, Self::Error> {
        if let Progress::Starting = self.progress {
            self.progress = Progress::Stopped {
                thread_id: self.pid,
                signal: None,
            };

            return Ok(self.event(self.pid, self.create_process_event()));
        }

        let event = match sys::wait_for_debug_stop(self.pid, &mut self.threads)? {
            DebugStop::Exception {
                thread_id,
                signal,
                code,
                address,
            } => {
                self.progress = Progress::Stopped {
                    thread_id,
                    signal: Some(signal),
                };

                let info = ExceptionInfo {
                    code: signal as u32,
                    flags: code as u32,
                    address,
                    parameters: Vec::new(),
                    first_chance: true,
                    breakpoint: signal == Signal::SIGTRAP,
                };

                self.event(thread_id, DebugEventInfo::Exception(info))
            }
            DebugStop::ThreadCreated {
                thread_id,
                new_thread_id,
            } => {
                self.progress = Progress::Stopped {
                    thread_id,
                    signal: None,
                };

                let info = CreateThreadInfo {
                    handle: 0,
                    thread_local_base: 0,
                    start_address: 0,
                };

                self.event(new_thread_id, DebugEventInfo::CreateThread(info))
            }
            DebugStop::ThreadExited {
                thread_id,
                exit_code,
            } => {
                self.progress = Progress::Stopped {
                    thread_id,
                    signal: None,
                };

                self.event(thread_id, DebugEventInfo::ExitThread { exit_code })
            }
            DebugStop::Exited { exit_code } => {
                self.progress = Progress::Exited;
                self.event(self.pid, DebugEventInfo::ExitProcess { exit_code })
            }
        };

        Ok(event)
    }

    fn resume(&mut self, decision: ContinueDecision) -> Result<(), Self::Error> {
        let Progress::Stopped { thread_id, signal } = self.progress else {
            return Ok(());
        };

        self.progress = Progress::Running;

        let signal = signal.filter(|_| decision == ContinueDecision::NotHandled);

        match ptrace::cont(thread_id, signal) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        match self.progress {
            Progress::Exited => Ok(()),
            Progress::Stopped { thread_id, .. } if self.attached => {
                tracing::debug!(pid = self.pid.as_raw(), "detaching from debuggee");

                match ptrace::detach(thread_id, None) {
                    Ok(()) | Err(Errno::ESRCH) => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            // running threads are detached by the kernel when the tracer
            // thread exits
            _ => Ok(()),
        }
    }
}
