use crate::debugger::ContinueDecision;
use crate::event::{DebugEvent, DebugEventInfo};
use crate::handler::EventHandler;

/// Outcome of dispatching a single debug event.
#[derive(Debug, PartialEq, Eq)]
pub struct Dispatched {
    /// How the debuggee should be resumed.
    pub decision: ContinueDecision,

    /// Event to enqueue, `None` if the event was ignored.
    pub event: Option<DebugEvent>,

    /// Exit code, if the event is the exit of the debugged process itself.
    pub exit_code: Option<u32>,
}

/// Classifies debug events and forwards them to an [EventHandler].
pub struct Dispatcher<H> {
    /// Process ID of the debuggee.
    process_id: u32,

    handler: H,
}

impl<H: EventHandler> Dispatcher<H> {
    /// Creates a dispatcher for the debuggee with the given process ID.
    pub const fn new(process_id: u32, handler: H) -> Self {
        Self {
            process_id,
            handler,
        }
    }

    /// Returns the process ID of the debuggee.
    pub const fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Classifies the event and invokes the matching handler.
    ///
    /// Events of an unknown kind are dropped and the debuggee auto-continues.
    pub fn dispatch(&mut self, event: DebugEvent) -> Dispatched {
        let tid = event.thread_id;
        let mut exit_code = None;

        let decision = match &event.info {
            DebugEventInfo::Exception(info) => self.handler.exception(tid, info),
            DebugEventInfo::CreateThread(info) => self.handler.create_thread(tid, info),
            DebugEventInfo::CreateProcess(info) => {
                self.handler.create_process(event.process_id, info)
            }
            DebugEventInfo::ExitThread { exit_code } => self.handler.exit_thread(tid, *exit_code),
            DebugEventInfo::ExitProcess { exit_code: code } => {
                if event.process_id == self.process_id {
                    exit_code = Some(*code);
                }
                self.handler.exit_process(event.process_id, *code)
            }
            DebugEventInfo::LoadDll(info) => self.handler.load_dll(tid, info),
            DebugEventInfo::UnloadDll { base_of_dll } => self.handler.unload_dll(tid, *base_of_dll),
            DebugEventInfo::OutputDebugString(info) => self.handler.output_debug_string(tid, info),
            DebugEventInfo::Rip(info) => self.handler.rip(tid, info),
            DebugEventInfo::Unknown { code } => {
                tracing::warn!(code, tid, "unknown debug event ignored");

                return Dispatched {
                    decision: ContinueDecision::AutoContinue,
                    event: None,
                    exit_code: None,
                };
            }
        };

        // the debuggee cannot be kept around once it is gone
        let decision = if exit_code.is_some() {
            decision.explicit()
        } else {
            decision
        };

        Dispatched {
            decision,
            event: Some(event),
            exit_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Dispatcher;
    use crate::debugger::ContinueDecision;
    use crate::event::{CreateProcessInfo, CreateThreadInfo, DebugEvent, DebugEventInfo};
    use crate::event::{ExceptionInfo, LoadDllInfo, OutputDebugStringInfo, RipInfo};
    use crate::handler::{DefaultHandler, EventHandler};

    const PID: u32 = 100;

    fn event(info: DebugEventInfo) -> DebugEvent {
        DebugEvent {
            process_id: PID,
            thread_id: 101,
            info,
        }
    }

    fn exception(breakpoint: bool) -> DebugEventInfo {
        DebugEventInfo::Exception(ExceptionInfo {
            code: 0xc0000005,
            flags: 0,
            address: 0x1000,
            parameters: vec![0, 0x2000],
            first_chance: true,
            breakpoint,
        })
    }

    fn non_exception_events() -> Vec<DebugEventInfo> {
        vec![
            DebugEventInfo::CreateThread(CreateThreadInfo {
                handle: 1,
                thread_local_base: 0,
                start_address: 0x4000,
            }),
            DebugEventInfo::CreateProcess(CreateProcessInfo {
                file_handle: 0,
                process_handle: 1,
                thread_handle: 2,
                base_of_image: 0x400000,
                debug_info_file_offset: 0,
                debug_info_size: 0,
                thread_local_base: 0,
                start_address: 0x401000,
                image_name: 0,
                unicode: false,
            }),
            DebugEventInfo::ExitThread { exit_code: 0 },
            DebugEventInfo::ExitProcess { exit_code: 0 },
            DebugEventInfo::LoadDll(LoadDllInfo {
                file_handle: 0,
                base_of_dll: 0x7000_0000,
                debug_info_file_offset: 0,
                debug_info_size: 0,
                image_name: 0,
                unicode: true,
            }),
            DebugEventInfo::UnloadDll {
                base_of_dll: 0x7000_0000,
            },
            DebugEventInfo::OutputDebugString(OutputDebugStringInfo {
                string_data: 0x5000,
                unicode: false,
                length: 5,
            }),
            DebugEventInfo::Rip(RipInfo {
                error: 1,
                rip_type: 0,
            }),
        ]
    }

    #[test]
    fn unhandled_exception_is_not_handled() {
        let mut dispatcher = Dispatcher::new(PID, DefaultHandler);
        let dispatched = dispatcher.dispatch(event(exception(false)));

        assert_eq!(dispatched.decision, ContinueDecision::NotHandled);
        assert!(dispatched.event.is_some());
        assert_eq!(dispatched.exit_code, None);
    }

    #[test]
    fn debugger_trap_is_handled() {
        let mut dispatcher = Dispatcher::new(PID, DefaultHandler);
        let dispatched = dispatcher.dispatch(event(exception(true)));

        assert_eq!(dispatched.decision, ContinueDecision::AutoContinue);
    }

    #[test]
    fn non_exception_kinds_auto_continue() {
        let mut dispatcher = Dispatcher::new(PID, DefaultHandler);

        for info in non_exception_events() {
            let kind = info.kind();
            let dispatched = dispatcher.dispatch(event(info));

            assert_eq!(
                dispatched.decision,
                ContinueDecision::AutoContinue,
                "{kind:?}"
            );
            assert!(dispatched.event.is_some(), "{kind:?}");
        }
    }

    #[test]
    fn unknown_kind_is_ignored_and_auto_continues() {
        let mut dispatcher = Dispatcher::new(PID, DefaultHandler);
        let dispatched = dispatcher.dispatch(event(DebugEventInfo::Unknown { code: 42 }));

        assert_eq!(dispatched.decision, ContinueDecision::AutoContinue);
        assert_eq!(dispatched.event, None);
    }

    #[test]
    fn only_debuggee_exit_ends_the_loop() {
        let mut dispatcher = Dispatcher::new(PID, DefaultHandler);

        let child_exit = DebugEvent {
            process_id: PID + 1,
            thread_id: 1,
            info: DebugEventInfo::ExitProcess { exit_code: 1 },
        };
        assert_eq!(dispatcher.dispatch(child_exit).exit_code, None);

        let dispatched = dispatcher.dispatch(event(DebugEventInfo::ExitProcess { exit_code: 7 }));
        assert_eq!(dispatched.exit_code, Some(7));
    }

    struct Deferring;

    impl EventHandler for Deferring {
        fn exception(&mut self, _thread_id: u32, _info: &ExceptionInfo) -> ContinueDecision {
            ContinueDecision::WaitForExplicitContinue
        }

        fn exit_process(&mut self, _process_id: u32, _exit_code: u32) -> ContinueDecision {
            ContinueDecision::WaitForExplicitContinue
        }
    }

    #[test]
    fn handler_can_defer_exceptions_but_not_debuggee_exit() {
        let mut dispatcher = Dispatcher::new(PID, Deferring);

        let dispatched = dispatcher.dispatch(event(exception(false)));
        assert_eq!(dispatched.decision, ContinueDecision::WaitForExplicitContinue);

        let dispatched = dispatcher.dispatch(event(DebugEventInfo::ExitProcess { exit_code: 0 }));
        assert_eq!(dispatched.decision, ContinueDecision::AutoContinue);
    }
}
