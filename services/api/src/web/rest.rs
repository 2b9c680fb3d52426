//! services/api/src/web/rest.rs
//!
//! The response envelope shared by every handler and the master definition for the
//! OpenAPI specification.

use axum::{extract::FromRequest, Json};
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::error::ServiceError;
use crate::web::{auth, conferences, courses, progress};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::verify_token_handler,
        auth::logout_handler,
        auth::change_password_handler,
        auth::update_profile_handler,
        auth::permissions_handler,
        courses::create_course_handler,
        courses::publish_course_handler,
        courses::add_module_handler,
        courses::add_lesson_handler,
        courses::create_quiz_handler,
        courses::add_question_handler,
        courses::enroll_handler,
        courses::course_content_handler,
        courses::my_courses_handler,
        progress::start_lesson_handler,
        progress::update_progress_handler,
        progress::submit_quiz_handler,
        progress::course_progress_handler,
        conferences::create_room_handler,
        conferences::add_participant_handler,
        conferences::start_conference_handler,
        conferences::end_conference_handler,
        conferences::cancel_conference_handler,
        conferences::join_conference_handler,
        conferences::leave_conference_handler,
        conferences::conference_details_handler,
        conferences::send_chat_handler,
        conferences::list_chat_handler,
        conferences::add_recording_handler,
        conferences::list_recordings_handler,
    ),
    components(schemas(Empty)),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Accounts, tokens and permissions."),
        (name = "courses", description = "Course authoring, enrollment and content."),
        (name = "progress", description = "Lesson progress and quiz attempts."),
        (name = "conferences", description = "Scheduled video sessions, chat and recordings.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

//=========================================================================================
// API Response Envelope
//=========================================================================================

/// Every successful response: `{"success": true, "message"?: ..., ...payload}`.
/// Failures are rendered by `ServiceError` with `success: false`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

/// A payload with no fields of its own.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct Empty {}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;

/// `Json` body extractor whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ServiceError))]
pub struct ApiJson<T>(pub T);

/// A success carrying a human-readable message.
pub fn ok<T: Serialize>(message: &str, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        message: Some(message.to_string()),
        data,
    }))
}

/// A success that only returns data.
pub fn with_data<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        message: None,
        data,
    }))
}
