//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use counsel_core::{BookingService, DatabaseService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub bookings: BookingService<dyn DatabaseService>,
    pub config: Arc<Config>,
    /// Cancelled on shutdown; live booking sockets close when it fires.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Self {
        Self {
            bookings: BookingService::new(Arc::clone(&db)),
            db,
            config,
            shutdown: CancellationToken::new(),
        }
    }
}
