//! This crate provides a default implementation of a debugger (to be used with
//! `dbgrelay-core`).
//!
//! The debugger is able to spawn a process (on the **same host machine**) as
//! a child and debug it, or to attach to a process already running.
//!
//! <div class="warning">
//!
//! *This crate is not meant to be used on its own! It merely implements the
//! interface (traits) provided by `dbgrelay-core`, so that the debugger can
//! be driven by a debugging session of that crate.*
//!
//! </div>
//!
//! # Supported Platforms
//!
//! Only **Linux** is supported. Debug events are mapped as follows:
//!
//! | Debug event | Linux source |
//! |---|---|
//! | `CreateProcess` | initial stop after spawn or attach |
//! | `Exception` | signal-delivery stop (`SIGTRAP` is a debugger trap) |
//! | `CreateThread` | `PTRACE_EVENT_CLONE` |
//! | `ExitThread` | `PTRACE_EVENT_EXIT` of a non-main thread |
//! | `ExitProcess` | exit (or kill) of the main thread |
//!
//! Other kinds are never reported.

mod common;
mod sys;

pub use self::common::debugger::Debugger;
pub use self::common::session::Session;
pub use self::sys::{Error, ProcessHandle, Result};
