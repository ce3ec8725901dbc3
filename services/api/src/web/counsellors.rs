//! services/api/src/web/counsellors.rs
//!
//! Counsellor profiles and their weekly availability.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use counsel_core::{CounsellorUpdate, NewCounsellor, Slot};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{port_error, HttpError};
use crate::web::rest::{CounsellorRequest, CounsellorResponse, CounsellorUpdateRequest, SlotDto};
use crate::web::state::AppState;

fn validate_slots(slots: Vec<SlotDto>) -> Result<Vec<Slot>, HttpError> {
    slots
        .into_iter()
        .map(|dto| {
            let slot = Slot::from(dto);
            slot.validate()
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid slot {}: {}", slot, e)))?;
            Ok(slot)
        })
        .collect()
}

fn required(field: &str, value: String) -> Result<String, HttpError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{} is required", field)));
    }
    Ok(value)
}

/// List all counsellors by name.
#[utoipa::path(
    get,
    path = "/counsellors",
    responses((status = 200, description = "All counsellors", body = [CounsellorResponse]))
)]
pub async fn list_counsellors_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CounsellorResponse>>, HttpError> {
    let counsellors = state
        .db
        .list_counsellors()
        .await
        .map_err(|e| port_error("Failed to list counsellors", e))?;
    Ok(Json(counsellors.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/counsellors/{id}",
    params(("id" = Uuid, Path, description = "Counsellor id")),
    responses(
        (status = 200, description = "The counsellor", body = CounsellorResponse),
        (status = 404, description = "Unknown counsellor")
    )
)]
pub async fn get_counsellor_handler(
    State(state): State<Arc<AppState>>,
    Path(counsellor_id): Path<Uuid>,
) -> Result<Json<CounsellorResponse>, HttpError> {
    let counsellor = state
        .db
        .get_counsellor(counsellor_id)
        .await
        .map_err(|e| port_error("Failed to load counsellor", e))?;
    Ok(Json(counsellor.into()))
}

/// Add a counsellor. Admins only.
#[utoipa::path(
    post,
    path = "/counsellors",
    request_body = CounsellorRequest,
    responses(
        (status = 201, description = "Counsellor created", body = CounsellorResponse),
        (status = 400, description = "Missing name or malformed slot"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn create_counsellor_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CounsellorRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let counsellor = NewCounsellor {
        name: required("Name", req.name)?,
        specialization: required("Specialization", req.specialization)?,
        bio: req.bio.trim().to_string(),
        availability: validate_slots(req.availability)?,
    };
    let counsellor = state
        .db
        .create_counsellor(counsellor)
        .await
        .map_err(|e| port_error("Failed to create counsellor", e))?;
    info!(counsellor_id = %counsellor.id, "Counsellor added");
    Ok((StatusCode::CREATED, Json(CounsellorResponse::from(counsellor))))
}

/// Edit a counsellor's profile or availability. Admins only.
///
/// Availability changes apply to future bookings; existing bookings keep their slot.
#[utoipa::path(
    put,
    path = "/counsellors/{id}",
    params(("id" = Uuid, Path, description = "Counsellor id")),
    request_body = CounsellorUpdateRequest,
    responses(
        (status = 200, description = "Counsellor updated", body = CounsellorResponse),
        (status = 400, description = "Malformed slot"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Unknown counsellor")
    )
)]
pub async fn update_counsellor_handler(
    State(state): State<Arc<AppState>>,
    Path(counsellor_id): Path<Uuid>,
    Json(req): Json<CounsellorUpdateRequest>,
) -> Result<Json<CounsellorResponse>, HttpError> {
    let update = CounsellorUpdate {
        name: req.name.map(|n| required("Name", n)).transpose()?,
        specialization: req
            .specialization
            .map(|s| required("Specialization", s))
            .transpose()?,
        bio: req.bio.map(|b| b.trim().to_string()),
        availability: req.availability.map(validate_slots).transpose()?,
    };
    let counsellor = state
        .db
        .update_counsellor(counsellor_id, update)
        .await
        .map_err(|e| port_error("Failed to update counsellor", e))?;
    info!(counsellor_id = %counsellor.id, "Counsellor updated");
    Ok(Json(counsellor.into()))
}
