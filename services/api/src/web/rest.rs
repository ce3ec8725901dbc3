//! services/api/src/web/rest.rs
//!
//! Contains the JSON payloads of the REST API and the master definition for
//! the OpenAPI specification.

use crate::error::HttpError;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use counsel_core::{Booking, BookingStats, Counsellor, MoodEntry, Resource, Slot, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{admin, auth, bookings, counsellors, resources};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        counsellors::list_counsellors_handler,
        counsellors::get_counsellor_handler,
        counsellors::create_counsellor_handler,
        counsellors::update_counsellor_handler,
        resources::list_resources_handler,
        resources::create_resource_handler,
        resources::update_resource_handler,
        resources::delete_resource_handler,
        bookings::create_booking_handler,
        bookings::list_bookings_handler,
        bookings::get_booking_handler,
        bookings::update_status_handler,
        bookings::record_mood_handler,
        admin::list_users_handler,
        admin::stats_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            UserResponse,
            SlotDto,
            MoodResponse,
            BookingResponse,
            CreateBookingRequest,
            UpdateStatusRequest,
            RecordMoodRequest,
            CounsellorResponse,
            CounsellorRequest,
            CounsellorUpdateRequest,
            ResourceResponse,
            ResourceRequest,
            ResourceUpdateRequest,
            StatsResponse,
        )
    ),
    tags(
        (name = "Counselling API", description = "Booking, counsellor and resource endpoints for the counselling marketplace.")
    )
)]
pub struct ApiDoc;

/// Parses an enum carried as a string in a payload, rejecting unknown values with 400.
pub(crate) fn parse_field<T>(field: &str, raw: &str) -> Result<T, HttpError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid {}: {}", field, e)))
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// One of `client`, `admin`, `counsellor`.
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            role: user.role.as_str().to_string(),
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

//=========================================================================================
// Bookings
//=========================================================================================

/// A weekly slot, e.g. `{"day": "Monday", "from": "09:00", "to": "10:00"}`.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct SlotDto {
    pub day: String,
    pub from: String,
    pub to: String,
}

impl From<Slot> for SlotDto {
    fn from(slot: Slot) -> Self {
        Self {
            day: slot.day,
            from: slot.from,
            to: slot.to,
        }
    }
}

impl From<SlotDto> for Slot {
    fn from(dto: SlotDto) -> Self {
        Slot::new(dto.day, dto.from, dto.to)
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct MoodResponse {
    pub label: String,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<MoodEntry> for MoodResponse {
    fn from(mood: MoodEntry) -> Self {
        Self {
            label: mood.label.as_str().to_string(),
            note: mood.note,
            updated_at: mood.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct BookingResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub counsellor_id: Uuid,
    pub counsellor_name: String,
    pub slot: SlotDto,
    /// One of `pending`, `confirmed`, `cancelled`, `completed`.
    pub status: String,
    pub mood: Option<MoodResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            client_id: booking.client_id,
            client_name: booking.client_name,
            client_email: booking.client_email,
            counsellor_id: booking.counsellor_id,
            counsellor_name: booking.counsellor_name,
            slot: booking.slot.into(),
            status: booking.status.as_str().to_string(),
            mood: booking.mood.map(MoodResponse::from),
            created_at: booking.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct CreateBookingRequest {
    pub counsellor_id: Uuid,
    /// Must be one of the counsellor's advertised slots.
    pub slot: Option<SlotDto>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct RecordMoodRequest {
    /// One of `Excellent`, `Good`, `Neutral`, `Low`, `Very Low`.
    pub label: String,
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    pub status: Option<String>,
    pub counsellor_id: Option<Uuid>,
}

//=========================================================================================
// Counsellors
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CounsellorResponse {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub bio: String,
    pub availability: Vec<SlotDto>,
    pub created_at: DateTime<Utc>,
}

impl From<Counsellor> for CounsellorResponse {
    fn from(counsellor: Counsellor) -> Self {
        Self {
            id: counsellor.id,
            name: counsellor.name,
            specialization: counsellor.specialization,
            bio: counsellor.bio,
            availability: counsellor.availability.into_iter().map(SlotDto::from).collect(),
            created_at: counsellor.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct CounsellorRequest {
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub availability: Vec<SlotDto>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct CounsellorUpdateRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub availability: Option<Vec<SlotDto>>,
}

//=========================================================================================
// Resources
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ResourceResponse {
    pub id: Uuid,
    pub title: String,
    /// One of `article`, `video`, `pdf`, `link`.
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub description: String,
    pub url: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        Self {
            id: resource.id,
            title: resource.title,
            kind: resource.kind.as_str().to_string(),
            category: resource.category,
            description: resource.description,
            url: resource.url,
            is_visible: resource.is_visible,
            created_at: resource.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ResourceRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
}

fn visible_by_default() -> bool {
    true
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct ResourceUpdateRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub is_visible: Option<bool>,
}

//=========================================================================================
// Admin Dashboard
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct StatsResponse {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
    /// Recorded moods keyed by label.
    pub moods: BTreeMap<String, usize>,
}

impl From<BookingStats> for StatsResponse {
    fn from(stats: BookingStats) -> Self {
        Self {
            total: stats.total,
            pending: stats.pending,
            confirmed: stats.confirmed,
            cancelled: stats.cancelled,
            completed: stats.completed,
            moods: stats
                .moods
                .into_iter()
                .map(|(label, count)| (label.as_str().to_string(), count))
                .collect(),
        }
    }
}
