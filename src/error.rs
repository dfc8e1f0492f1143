use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::geo::GeocodeError;
use crate::models::booking::{DeliveryStatus, RequestStatus};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request-status transition: {from:?} -> {to:?}")]
    InvalidRequestTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("invalid delivery-status transition: {from:?} -> {to:?}")]
    InvalidDeliveryTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("booking is in a terminal state: {0}")]
    AlreadyTerminal(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("no match found")]
    NoMatchFound,

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind, independent of the human-readable detail.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidRequestTransition { .. }
            | AppError::InvalidDeliveryTransition { .. } => "invalid_transition",
            AppError::AlreadyTerminal(_) => "already_terminal",
            AppError::PreconditionFailed(_) => "precondition_failed",
            AppError::NoMatchFound => "no_match_found",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_)
            | AppError::InvalidRequestTransition { .. }
            | AppError::InvalidDeliveryTransition { .. }
            | AppError::AlreadyTerminal(_) => StatusCode::CONFLICT,
            AppError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            AppError::NoMatchFound => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::Unresolved(address) => {
                AppError::Validation(format!("could not resolve address: {address}"))
            }
            GeocodeError::Backend(detail) => AppError::UpstreamUnavailable(detail),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind(),
            "detail": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}
