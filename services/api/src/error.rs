//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service, and the mapping from
//! booking failures to HTTP responses.

use crate::config::ConfigError;
use axum::http::StatusCode;
use counsel_core::{BookingError, PortError};
use tracing::{error, warn};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Handler-level error: a status code and a user-facing message.
pub type HttpError = (StatusCode, String);

/// Maps a booking failure onto an HTTP response, logging it on the way out.
pub fn booking_error(context: &str, err: BookingError) -> HttpError {
    let status = match &err {
        BookingError::Validation(_) => StatusCode::BAD_REQUEST,
        BookingError::Authorization { .. } => StatusCode::FORBIDDEN,
        BookingError::InvalidTransition { .. } | BookingError::Conflict(_) => StatusCode::CONFLICT,
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        error!("{}: {}", context, err);
    } else {
        warn!("{}: {}", context, err);
    }
    (status, err.to_string())
}

/// Maps a storage failure from a direct port call.
pub fn port_error(context: &str, err: PortError) -> HttpError {
    booking_error(context, BookingError::from(err))
}
