use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use dbgrelay_core::event::DebuggerEvent;
use dbgrelay_core::handler::DefaultHandler;
use dbgrelay_core::session::DebuggerSession;
use dbgrelay_core::stream::open_stream;
use dbgrelay_debugger::Debugger;
use futures_util::StreamExt;
use futures_util::stream::{self, Stream};

use crate::app::AppState;
use crate::error::ApiError;
use crate::request::{ContinueRequest, CreateSession, CreatedSession, SessionSummary};

/// `POST /debugger`
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSession>,
) -> Result<(StatusCode, Json<CreatedSession>), ApiError> {
    let session = match req {
        CreateSession::Spawn(req) => {
            DebuggerSession::spawn(Debugger::new(), req.into(), DefaultHandler).await?
        }
        CreateSession::Attach(req) => {
            DebuggerSession::attach(Debugger::new(), req.pid, DefaultHandler).await?
        }
    };

    let pid = session.process_id();
    let index = state.registry.register(session);

    tracing::info!(index, pid, "debugger registered");

    Ok((StatusCode::CREATED, Json(CreatedSession { index, pid })))
}

/// `GET /debugger`
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummary>> {
    let sessions = state
        .registry
        .snapshot()
        .into_iter()
        .map(|(index, session)| SessionSummary {
            index,
            pid: session.process_id(),
            state: session.state(),
        })
        .collect();

    Json(sessions)
}

/// `POST /debugger/:index/continue`
pub async fn continue_session(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(req): Json<ContinueRequest>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .registry
        .lookup(index)
        .ok_or(ApiError::NotFound(index))?;

    session.continue_with(req.decision)?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /debugger/:index`
pub async fn release_session(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .registry
        .unregister(index)
        .ok_or(ApiError::NotFound(index))?;

    session.release().await;

    tracing::info!(index, pid = session.process_id(), "debugger released");

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /debugger/:index/event`
///
/// The index is taken verbatim, so that a malformed index is reported on the
/// stream like a missing one.
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = match index.parse::<usize>() {
        Ok(index) => open_stream(&state.registry, index),
        Err(_) => stream::iter([DebuggerEvent::not_found(&index)]).boxed(),
    };

    let events = events.map(|event| {
        tracing::trace!(name = event.name(), "sse event");
        Ok(Event::default().event(event.name()).data(event.payload()))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive))
}
