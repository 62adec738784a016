//! Crate implementing the HTTP server and the CLI commands.

mod app;
mod cli;
mod config;
mod error;
mod handlers;
mod request;
mod trace;

pub use self::app::{AppState, router, serve};
pub use self::cli::{CliAction, CliOpts};
pub use self::config::ServerConfig;
pub use self::error::ApiError;
pub use self::request::{
    AttachRequest, ContinueRequest, CreateSession, CreatedSession, SessionSummary, SpawnRequest,
};
pub use self::trace::evaluate_trace;
