//! services/api/src/services/mod.rs
//!
//! Application services. Each one owns a handle to the storage ports and turns a
//! request into domain operations; the web layer only parses and wraps.

pub mod auth;
pub mod conferences;
pub mod courses;
pub mod progress;

pub use auth::{AuthService, AuthUser};
pub use conferences::ConferenceService;
pub use courses::CourseService;
pub use progress::ProgressService;
