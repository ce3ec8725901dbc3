//! services/api/src/web/bookings.rs
//!
//! Booking endpoints. Every handler delegates to `BookingService`, which owns
//! the lifecycle and authorization rules.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use counsel_core::{BookingFilter, BookingStatus, MoodLabel, User};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{booking_error, HttpError};
use crate::web::rest::{
    parse_field, BookingQuery, BookingResponse, CreateBookingRequest, RecordMoodRequest,
    UpdateStatusRequest,
};
use crate::web::state::AppState;

impl BookingQuery {
    pub(crate) fn to_filter(&self) -> Result<BookingFilter, HttpError> {
        Ok(BookingFilter {
            client_id: None,
            counsellor_id: self.counsellor_id,
            status: self
                .status
                .as_deref()
                .map(|s| parse_field::<BookingStatus>("status", s))
                .transpose()?,
        })
    }
}

/// Request a session with a counsellor.
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking requested", body = BookingResponse),
        (status = 400, description = "Missing or unavailable slot"),
        (status = 403, description = "Only clients can book"),
        (status = 404, description = "Unknown counsellor")
    )
)]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = state
        .bookings
        .create_booking(&user, req.counsellor_id, req.slot.map(Into::into))
        .await
        .map_err(|e| booking_error("Failed to create booking", e))?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// List bookings, newest first. Clients only ever see their own.
#[utoipa::path(
    get,
    path = "/bookings",
    params(BookingQuery),
    responses(
        (status = 200, description = "Matching bookings", body = [BookingResponse]),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Role may not list bookings")
    )
)]
pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Vec<BookingResponse>>, HttpError> {
    let bookings = state
        .bookings
        .list_bookings(&user.actor(), query.to_filter()?)
        .await
        .map_err(|e| booking_error("Failed to list bookings", e))?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// Fetch one booking.
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "The booking", body = BookingResponse),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Unknown booking")
    )
)]
pub async fn get_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, HttpError> {
    let booking = state
        .bookings
        .get_booking(booking_id, &user.actor())
        .await
        .map_err(|e| booking_error("Failed to load booking", e))?;
    Ok(Json(booking.into()))
}

/// Move a booking to a new status.
#[utoipa::path(
    patch,
    path = "/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated booking", body = BookingResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Role may not make this change"),
        (status = 404, description = "Unknown booking"),
        (status = 409, description = "Transition not allowed, or the booking changed concurrently")
    )
)]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, HttpError> {
    let status = parse_field::<BookingStatus>("status", &req.status)?;
    let booking = state
        .bookings
        .update_status(booking_id, status, &user.actor())
        .await
        .map_err(|e| booking_error("Failed to update booking status", e))?;
    Ok(Json(booking.into()))
}

/// Record (or revise) the mood for a session.
#[utoipa::path(
    put,
    path = "/bookings/{id}/mood",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = RecordMoodRequest,
    responses(
        (status = 200, description = "Completed booking", body = BookingResponse),
        (status = 400, description = "Unknown mood label"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Unknown booking"),
        (status = 409, description = "Booking is not confirmed or completed")
    )
)]
pub async fn record_mood_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<RecordMoodRequest>,
) -> Result<Json<BookingResponse>, HttpError> {
    let label = parse_field::<MoodLabel>("mood label", &req.label)?;
    let booking = state
        .bookings
        .record_mood(booking_id, label, req.note.as_deref(), &user.actor())
        .await
        .map_err(|e| booking_error("Failed to record mood", e))?;
    Ok(Json(booking.into()))
}
