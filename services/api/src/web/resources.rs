//! services/api/src/web/resources.rs
//!
//! The self-help resource library. Hidden resources are only listed for admins.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use counsel_core::{NewResource, ResourceKind, ResourceUpdate, Role, User};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{port_error, HttpError};
use crate::web::rest::{parse_field, ResourceRequest, ResourceResponse, ResourceUpdateRequest};
use crate::web::state::AppState;

fn non_blank(field: &str, value: String) -> Result<String, HttpError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{} is required", field)));
    }
    Ok(value)
}

#[utoipa::path(
    get,
    path = "/resources",
    responses((status = 200, description = "Resources, newest first", body = [ResourceResponse]))
)]
pub async fn list_resources_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ResourceResponse>>, HttpError> {
    let resources = state
        .db
        .list_resources(user.role != Role::Admin)
        .await
        .map_err(|e| port_error("Failed to list resources", e))?;
    Ok(Json(resources.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/resources",
    request_body = ResourceRequest,
    responses(
        (status = 201, description = "Resource created", body = ResourceResponse),
        (status = 400, description = "Missing title or url, or unknown type"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn create_resource_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResourceRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let resource = NewResource {
        title: non_blank("Title", req.title)?,
        kind: parse_field::<ResourceKind>("type", &req.kind)?,
        category: req.category.trim().to_string(),
        description: req.description.trim().to_string(),
        url: non_blank("URL", req.url)?,
        is_visible: req.is_visible,
    };
    let resource = state
        .db
        .create_resource(resource)
        .await
        .map_err(|e| port_error("Failed to create resource", e))?;
    info!(resource_id = %resource.id, "Resource added");
    Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))))
}

#[utoipa::path(
    put,
    path = "/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource id")),
    request_body = ResourceUpdateRequest,
    responses(
        (status = 200, description = "Resource updated", body = ResourceResponse),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Unknown resource")
    )
)]
pub async fn update_resource_handler(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<Uuid>,
    Json(req): Json<ResourceUpdateRequest>,
) -> Result<Json<ResourceResponse>, HttpError> {
    let update = ResourceUpdate {
        title: req.title.map(|t| non_blank("Title", t)).transpose()?,
        kind: req
            .kind
            .as_deref()
            .map(|k| parse_field::<ResourceKind>("type", k))
            .transpose()?,
        category: req.category.map(|c| c.trim().to_string()),
        description: req.description.map(|d| d.trim().to_string()),
        url: req.url.map(|u| non_blank("URL", u)).transpose()?,
        is_visible: req.is_visible,
    };
    let resource = state
        .db
        .update_resource(resource_id, update)
        .await
        .map_err(|e| port_error("Failed to update resource", e))?;
    Ok(Json(resource.into()))
}

#[utoipa::path(
    delete,
    path = "/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Unknown resource")
    )
)]
pub async fn delete_resource_handler(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<Uuid>,
) -> Result<StatusCode, HttpError> {
    state
        .db
        .delete_resource(resource_id)
        .await
        .map_err(|e| port_error("Failed to delete resource", e))?;
    info!(resource_id = %resource_id, "Resource deleted");
    Ok(StatusCode::NO_CONTENT)
}
