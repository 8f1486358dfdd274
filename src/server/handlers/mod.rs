//! HTTP handlers for the server.

pub mod boxes;
pub mod labels;
pub mod printers;

use axum::http::StatusCode;

use crate::error::WarelabelError;

/// Status code for a failed operation.
pub fn status_for(error: &WarelabelError) -> StatusCode {
    match error {
        WarelabelError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WarelabelError::Precondition(_) => StatusCode::CONFLICT,
        WarelabelError::NotFound(_) => StatusCode::NOT_FOUND,
        WarelabelError::Resolution { .. }
        | WarelabelError::Transport { .. }
        | WarelabelError::Dispatch { .. }
        | WarelabelError::JobFailed { .. } => StatusCode::BAD_GATEWAY,
        WarelabelError::Render(_) | WarelabelError::Config(_) | WarelabelError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn reject(error: WarelabelError) -> (StatusCode, String) {
    (status_for(&error), error.to_string())
}
