pub mod auth;
pub mod conferences;
pub mod courses;
pub mod middleware;
pub mod progress;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds the API routes. The binary adds CORS, tracing and the Swagger UI on top.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/verify-token", post(auth::verify_token_handler))
        .route("/logout", post(auth::logout_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/change-password", post(auth::change_password_handler))
        .route("/profile", put(auth::update_profile_handler))
        .route("/permissions", get(auth::permissions_handler))
        .route("/courses", post(courses::create_course_handler))
        .route("/courses/{id}/publish", post(courses::publish_course_handler))
        .route("/courses/{id}/modules", post(courses::add_module_handler))
        .route("/courses/{id}/enroll", post(courses::enroll_handler))
        .route("/courses/{id}/content", get(courses::course_content_handler))
        .route("/courses/{id}/progress", get(progress::course_progress_handler))
        .route("/modules/{id}/lessons", post(courses::add_lesson_handler))
        .route("/lessons/{id}/quizzes", post(courses::create_quiz_handler))
        .route("/lessons/{id}/start", post(progress::start_lesson_handler))
        .route("/lessons/{id}/progress", post(progress::update_progress_handler))
        .route("/quizzes/{id}/questions", post(courses::add_question_handler))
        .route("/quizzes/{id}/attempts", post(progress::submit_quiz_handler))
        .route("/my-courses", get(courses::my_courses_handler))
        .route("/conferences", post(conferences::create_room_handler))
        .route(
            "/conferences/{room_id}",
            get(conferences::conference_details_handler),
        )
        .route(
            "/conferences/{room_id}/participants",
            post(conferences::add_participant_handler),
        )
        .route(
            "/conferences/{room_id}/start",
            post(conferences::start_conference_handler),
        )
        .route(
            "/conferences/{room_id}/end",
            post(conferences::end_conference_handler),
        )
        .route(
            "/conferences/{room_id}/cancel",
            post(conferences::cancel_conference_handler),
        )
        .route(
            "/conferences/{room_id}/join",
            post(conferences::join_conference_handler),
        )
        .route(
            "/conferences/{room_id}/leave",
            post(conferences::leave_conference_handler),
        )
        .route(
            "/conferences/{room_id}/chat",
            post(conferences::send_chat_handler).get(conferences::list_chat_handler),
        )
        .route(
            "/conferences/{room_id}/recordings",
            post(conferences::add_recording_handler).get(conferences::list_recordings_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
