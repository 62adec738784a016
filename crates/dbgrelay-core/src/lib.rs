//! This crate allows to debug a process and stream its debug events.
//!
//! A [DebuggerSession](self::session::DebuggerSession) spawns (or attaches
//! to) a process under debug control, and runs a debug loop on a dedicated
//! thread. Every OS debug event is classified, handed to an
//! [EventHandler](self::handler::EventHandler) deciding how the debuggee is
//! resumed, and queued for consumers.
//!
//! ```no_run
//! use dbgrelay_core::Command;
//! use dbgrelay_core::handler::DefaultHandler;
//! use dbgrelay_core::registry::SessionRegistry;
//! use dbgrelay_core::session::DebuggerSession;
//! use dbgrelay_core::stream::open_stream;
//! use dbgrelay_debugger::Debugger;
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = SessionRegistry::new();
//!
//!     let session = DebuggerSession::spawn(Debugger, Command::new("ls"), DefaultHandler)
//!         .await
//!         .unwrap();
//!
//!     let index = registry.register(session);
//!
//!     let mut events = open_stream(&registry, index);
//!
//!     while let Some(event) = events.next().await {
//!         println!("{}: {}", event.name(), event.payload());
//!     }
//! }
//! ```
//!
//! # Implementing a custom debugger
//!
//! The [Debugger](self::debugger::Debugger),
//! [DebugSession](self::debugger::DebugSession) and
//! [TargetHandle](self::debugger::TargetHandle) traits abstract the OS
//! debugging primitives. `dbgrelay-debugger` implements them for the local
//! machine.

/// Module containing traits for implementing a custom debugger.
pub mod debugger;

/// Module classifying debug events.
pub mod dispatch;

/// Module containing the events streamed to consumers.
pub mod event;

/// Module containing traits for handling debug events.
pub mod handler;

/// Module containing the session registry.
pub mod registry;

/// Module implementing debugging sessions.
pub mod session;

/// Module implementing event streams.
pub mod stream;

mod command;
mod error;

pub use self::command::{Command, CommandEnv};
pub use self::error::{Error, Result};
