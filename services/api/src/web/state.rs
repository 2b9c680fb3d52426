//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::services::{AuthService, ConferenceService, CourseService, ProgressService};
use lms_core::ports::DatabaseService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub auth: AuthService,
    pub courses: CourseService,
    pub progress: ProgressService,
    pub conferences: ConferenceService,
}

impl AppState {
    /// Wires every service to the same storage adapter.
    pub fn new(db: Arc<dyn DatabaseService>, config: &Config) -> Self {
        Self {
            auth: AuthService::new(db.clone(), config.jwt_secret.clone(), config.token_ttl_hours),
            courses: CourseService::new(db.clone()),
            progress: ProgressService::new(db.clone()),
            conferences: ConferenceService::new(
                db.clone(),
                config.meeting_base_url.clone(),
                config.default_max_participants,
            ),
            db,
        }
    }
}
