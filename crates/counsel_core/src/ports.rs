//! crates/counsel_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage or identity backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Booking, BookingChange, BookingFilter, BookingUpdate, Counsellor, CounsellorUpdate,
    NewBooking, NewCounsellor, NewResource, Resource, ResourceUpdate, Role, User,
    UserCredentials,
};
use crate::feed::Subscription;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A write precondition did not hold, or a unique key is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user_with_email(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn list_users(&self) -> PortResult<Vec<User>>;

    // --- Auth sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live session to its user id. Expired sessions are `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_booking(&self, booking: NewBooking) -> PortResult<Booking>;

    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking>;

    /// Applies `update` atomically. Fails with `Conflict` when the stored status
    /// is not `update.expected()`, leaving the record untouched.
    async fn apply_booking_update(
        &self,
        booking_id: Uuid,
        update: &BookingUpdate,
    ) -> PortResult<Booking>;

    /// Newest first; ties broken by id.
    async fn query_bookings(&self, filter: &BookingFilter) -> PortResult<Vec<Booking>>;

    /// Subscribes to future changes matching `filter`. The listener lives exactly
    /// as long as the returned handle.
    fn subscribe_bookings(&self, filter: BookingFilter) -> PortResult<Subscription<BookingChange>>;
}

#[async_trait]
pub trait CounsellorStore: Send + Sync {
    async fn create_counsellor(&self, counsellor: NewCounsellor) -> PortResult<Counsellor>;

    async fn get_counsellor(&self, counsellor_id: Uuid) -> PortResult<Counsellor>;

    async fn list_counsellors(&self) -> PortResult<Vec<Counsellor>>;

    async fn update_counsellor(
        &self,
        counsellor_id: Uuid,
        update: CounsellorUpdate,
    ) -> PortResult<Counsellor>;
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn create_resource(&self, resource: NewResource) -> PortResult<Resource>;

    async fn get_resource(&self, resource_id: Uuid) -> PortResult<Resource>;

    async fn list_resources(&self, visible_only: bool) -> PortResult<Vec<Resource>>;

    async fn update_resource(
        &self,
        resource_id: Uuid,
        update: ResourceUpdate,
    ) -> PortResult<Resource>;

    async fn delete_resource(&self, resource_id: Uuid) -> PortResult<()>;
}

/// Everything the application needs from its persistence backend.
pub trait DatabaseService: UserStore + BookingStore + CounsellorStore + ResourceStore {}

impl<T> DatabaseService for T where T: UserStore + BookingStore + CounsellorStore + ResourceStore {}
