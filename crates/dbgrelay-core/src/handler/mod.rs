use crate::debugger::ContinueDecision;
use crate::event::{CreateProcessInfo, CreateThreadInfo, ExceptionInfo, LoadDllInfo};
use crate::event::{OutputDebugStringInfo, RipInfo};

/// Trait for implementing a debug event handler.
///
/// Each function is called by the debug loop while the debuggee is
/// suspended, and returns how the debuggee should be resumed. Handlers run on
/// the debug loop thread, so they should return quickly.
///
/// Every function has a default implementation matching the
/// [DefaultHandler] policy.
pub trait EventHandler: Send + 'static {
    /// Function called when an exception occurred in the debuggee.
    ///
    /// By default, debugger traps are handled and any other exception is
    /// passed back to the debuggee. Returning
    /// [WaitForExplicitContinue](ContinueDecision::WaitForExplicitContinue)
    /// keeps the debuggee suspended until
    /// [continue_with](crate::session::DebuggerSession::continue_with) is
    /// called.
    fn exception(&mut self, _thread_id: u32, info: &ExceptionInfo) -> ContinueDecision {
        if info.breakpoint {
            ContinueDecision::AutoContinue
        } else {
            ContinueDecision::NotHandled
        }
    }

    /// Function called when a thread is created.
    fn create_thread(&mut self, _thread_id: u32, _info: &CreateThreadInfo) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }

    /// Function called when a process is created (or attached to).
    fn create_process(&mut self, _process_id: u32, _info: &CreateProcessInfo) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }

    /// Function called when a thread has exited.
    fn exit_thread(&mut self, _thread_id: u32, _exit_code: u32) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }

    /// Function called when a process has exited.
    fn exit_process(&mut self, _process_id: u32, _exit_code: u32) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }

    /// Function called when a shared library is loaded.
    fn load_dll(&mut self, _thread_id: u32, _info: &LoadDllInfo) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }

    /// Function called when a shared library is unloaded.
    fn unload_dll(&mut self, _thread_id: u32, _base_of_dll: u64) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }

    /// Function called when the debuggee sends a debug string.
    fn output_debug_string(
        &mut self,
        _thread_id: u32,
        _info: &OutputDebugStringInfo,
    ) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }

    /// Function called when the debuggee died outside of the debugger's
    /// control.
    fn rip(&mut self, _thread_id: u32, _info: &RipInfo) -> ContinueDecision {
        ContinueDecision::AutoContinue
    }
}

/// Event handler applying the default continue policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandler;

impl EventHandler for DefaultHandler {}
