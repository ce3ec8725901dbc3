//! crates/counsel_core/src/error.rs
//!
//! Failure taxonomy for booking operations.

use crate::domain::{BookingStatus, Role};
use crate::ports::PortError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    /// The request was incomplete or semantically invalid (e.g. no slot chosen).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The actor's role or ownership does not permit the operation.
    #[error("A {role} may not {action}")]
    Authorization { action: &'static str, role: &'static str },

    /// The requested status is not reachable from the current one.
    #[error("Cannot move a booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// The booking changed between read and write.
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// The persistence or identity backend failed. The only retryable category.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl BookingError {
    pub(crate) const fn unauthorized(action: &'static str, role: Role) -> Self {
        Self::Authorization {
            action,
            role: role.as_str(),
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

impl From<PortError> for BookingError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => Self::NotFound(what),
            PortError::Conflict(what) => Self::Conflict(what),
            PortError::Unauthorized => Self::Authorization {
                action: "access this record",
                role: "caller",
            },
            PortError::Unexpected(msg) => Self::BackendUnavailable(msg),
        }
    }
}

/// A convenience type alias for `Result<T, BookingError>`.
pub type BookingResult<T> = Result<T, BookingError>;
