//! Shared fixtures for the integration tests. Everything runs against `InMemoryDb`.

#![allow(dead_code)]

use api_lib::adapters::InMemoryDb;
use api_lib::config::Config;
use api_lib::services::courses::{CourseDraft, LessonDraft};
use api_lib::services::AuthUser;
use api_lib::web::AppState;
use lms_core::domain::{NewUser, Role};
use lms_core::ports::{DatabaseService, UserRepository};
use std::sync::Arc;
use uuid::Uuid;

pub fn app() -> Arc<AppState> {
    app_with(Config::for_tests())
}

pub fn app_with(config: Config) -> Arc<AppState> {
    let db: Arc<dyn DatabaseService> = Arc::new(InMemoryDb::new());
    Arc::new(AppState::new(db, &config))
}

/// Inserts a user straight into the store. The password hash is a placeholder, so
/// these users cannot log in; use `AuthService::register` when a login is needed.
pub async fn seed_user(state: &AppState, username: &str, role: Role) -> AuthUser {
    let user = state
        .db
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            hashed_password: "not-a-hash".to_string(),
            role,
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
        })
        .await
        .unwrap();
    AuthUser {
        id: user.id,
        username: user.username,
        role: user.role,
        email: user.email,
    }
}

pub fn draft(title: &str) -> CourseDraft {
    CourseDraft {
        title: title.to_string(),
        description: "An introduction".to_string(),
        category: "programming".to_string(),
        ..Default::default()
    }
}

pub fn text_lesson(title: &str, order: i32, is_preview: bool) -> LessonDraft {
    LessonDraft {
        title: title.to_string(),
        content_type: "text".to_string(),
        order,
        text_content: Some(format!("Body of {}", title)),
        is_preview: Some(is_preview),
        ..Default::default()
    }
}

/// A course with one module, owned by `instructor`. Returns (course_id, module_id).
pub async fn course_with_module(
    state: &AppState,
    instructor: &AuthUser,
    publish: bool,
) -> (Uuid, Uuid) {
    let course_id = state
        .courses
        .create_course(instructor.id, draft("Rust 101"))
        .await
        .unwrap()
        .course_id;
    let module_id = state
        .courses
        .add_module(instructor, course_id, "Basics", "", 1)
        .await
        .unwrap()
        .module_id;
    if publish {
        state
            .courses
            .publish_course(instructor, course_id, true)
            .await
            .unwrap();
    }
    (course_id, module_id)
}
