//! services/api/src/web/mod.rs
//!
//! The HTTP surface: handlers, middleware, and the router that wires them together.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod counsellors;
pub mod middleware;
pub mod protocol;
pub mod resources;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::{require_admin, require_auth};
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Builds the API router. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Admin routes; the auth layer below runs first and supplies the user.
    let admin_routes = Router::new()
        .route("/counsellors", post(counsellors::create_counsellor_handler))
        .route("/counsellors/{id}", put(counsellors::update_counsellor_handler))
        .route("/resources", post(resources::create_resource_handler))
        .route(
            "/resources/{id}",
            put(resources::update_resource_handler).delete(resources::delete_resource_handler),
        )
        .route("/admin/users", get(admin::list_users_handler))
        .route("/admin/stats", get(admin::stats_handler))
        .route_layer(axum_middleware::from_fn(require_admin));

    // Routes for any signed-in user
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/counsellors", get(counsellors::list_counsellors_handler))
        .route("/counsellors/{id}", get(counsellors::get_counsellor_handler))
        .route("/resources", get(resources::list_resources_handler))
        .route(
            "/bookings",
            post(bookings::create_booking_handler).get(bookings::list_bookings_handler),
        )
        .route("/bookings/live", get(ws_handler))
        .route("/bookings/{id}", get(bookings::get_booking_handler))
        .route("/bookings/{id}/status", patch(bookings::update_status_handler))
        .route("/bookings/{id}/mood", put(bookings::record_mood_handler))
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
