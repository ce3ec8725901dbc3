//! services/api/src/web/admin.rs
//!
//! Admin dashboard endpoints.

use axum::{extract::State, Extension, Json};
use counsel_core::{BookingFilter, BookingStats, User};
use std::sync::Arc;

use crate::error::{booking_error, port_error, HttpError};
use crate::web::rest::{StatsResponse, UserResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All registered users", body = [UserResponse]),
        (status = 403, description = "Admins only")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, HttpError> {
    let users = state
        .db
        .list_users()
        .await
        .map_err(|e| port_error("Failed to list users", e))?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Booking counts per status and recorded moods per label.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = StatsResponse),
        (status = 403, description = "Admins only")
    )
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<StatsResponse>, HttpError> {
    let bookings = state
        .bookings
        .list_bookings(&user.actor(), BookingFilter::default())
        .await
        .map_err(|e| booking_error("Failed to load bookings for stats", e))?;
    Ok(Json(BookingStats::from_bookings(&bookings).into()))
}
