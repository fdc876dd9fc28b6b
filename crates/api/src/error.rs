use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use infra::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("operation not allowed in the current tournament status: {0}")]
    InvalidState(String),

    #[error("user already holds a role in this tournament")]
    RoleConflict,

    #[error("approved participant count must be 1, 2, 4, 8 or 16, got {0}")]
    BadParticipantCount(usize),

    #[error("not enough seats left for this booking")]
    InsufficientSeats,

    #[error("vote already submitted for this tournament")]
    DuplicateVote,

    #[error("prize pool is empty")]
    EmptyPool,

    #[error("prizes have already been distributed for this tournament")]
    IdempotencyViolation,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("authentication required")]
    NotAuthenticated,

    #[error("database error")]
    Db(#[from] StoreError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code carried next to the human message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::RoleConflict => "ROLE_CONFLICT",
            AppError::BadParticipantCount(_) => "BAD_PARTICIPANT_COUNT",
            AppError::InsufficientSeats => "INSUFFICIENT_SEATS",
            AppError::DuplicateVote => "DUPLICATE_VOTE",
            AppError::EmptyPool => "EMPTY_POOL",
            AppError::IdempotencyViolation => "IDEMPOTENCY_VIOLATION",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotAuthenticated => "NOT_AUTHENTICATED",
            AppError::Db(_) | AppError::Anyhow(_) => "INTERNAL",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::Db(_) | AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Authorization failures surface as 400 like the other domain
            // refusals; clients only distinguish 401.
            _ => StatusCode::BAD_REQUEST,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self:?}");
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
                code: self.code(),
            }),
        )
            .into_response()
    }
}
