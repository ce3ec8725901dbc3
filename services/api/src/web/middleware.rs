//! services/api/src/web/middleware.rs
//!
//! Authentication and role middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use counsel_core::{check_access, AccessDecision, Identity, PortError, Role, User};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::port_error;
use crate::web::auth::session_cookie;
use crate::web::state::AppState;

/// Middleware that validates the auth session cookie and loads the user.
///
/// If valid, inserts the `User` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = || (StatusCode::UNAUTHORIZED, "Not signed in".to_string()).into_response();

    let auth_session_id = session_cookie(req.headers()).ok_or_else(unauthorized)?;

    let user_id = match state.db.validate_auth_session(auth_session_id).await {
        Ok(user_id) => user_id,
        Err(PortError::Unauthorized | PortError::NotFound(_)) => {
            debug!("Rejected an unknown or expired auth session");
            return Err(unauthorized());
        }
        Err(e) => return Err(port_error("Failed to validate auth session", e).into_response()),
    };

    let user = match state.db.get_user_by_id(user_id).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            warn!(user_id = %user_id, "Auth session refers to a missing user");
            return Err(unauthorized());
        }
        Err(e) => return Err(port_error("Failed to load user", e).into_response()),
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware for admin-only routes. Must run after `require_auth`.
///
/// Anonymous callers get 401. Signed-in users with another role get 403 and a
/// `Location` header pointing at their own home page.
pub async fn require_admin(req: Request, next: Next) -> Response {
    let identity = Identity::from(req.extensions().get::<User>().cloned());
    match check_access(&identity, Role::Admin) {
        AccessDecision::Allow => next.run(req).await,
        AccessDecision::Wait | AccessDecision::RedirectToLogin => {
            (StatusCode::UNAUTHORIZED, "Not signed in".to_string()).into_response()
        }
        AccessDecision::RedirectToHome(role) => {
            warn!(role = role.as_str(), path = %req.uri().path(), "Admin route refused");
            (
                StatusCode::FORBIDDEN,
                [(header::LOCATION, HeaderValue::from_static(role.home_path()))],
                "Admins only".to_string(),
            )
                .into_response()
        }
    }
}
