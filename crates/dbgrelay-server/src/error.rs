use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Error returned by the HTTP routes.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// No session is registered at the requested index.
    #[error("Cannot find debugger at index {0}")]
    NotFound(usize),

    /// Debugging session failure.
    #[error(transparent)]
    Debugger(#[from] dbgrelay_core::Error<dbgrelay_debugger::Error>),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i32>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        use dbgrelay_core::Error;

        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Debugger(Error::Launch { .. } | Error::Attach { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Debugger(Error::LoopNotRunning) => StatusCode::CONFLICT,
            Self::Debugger(Error::LoopVanished) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let code = match self {
            Self::Debugger(ref e) => e.os_error_code(),
            Self::NotFound(_) => None,
        };

        tracing::debug!(%status, error = %self, "request failed");

        let body = ErrorBody {
            error: self.to_string(),
            code,
        };

        (status, Json(body)).into_response()
    }
}
