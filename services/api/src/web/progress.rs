//! services/api/src/web/progress.rs
//!
//! Lesson tracking, quiz attempts and course progress for the calling student.

use axum::{
    extract::{Path, State},
    Extension,
};
use lms_core::access::Permission;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::progress::{
    CourseProgressView, LessonProgressView, LessonStarted, QuizResult, SubmittedAnswer,
};
use crate::services::AuthUser;
use crate::web::middleware::require_permission;
use crate::web::rest::{ok, with_data, ApiJson, ApiResult};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    pub completion_percentage: f64,
    /// Minutes to add to the running total.
    #[serde(default)]
    pub time_spent: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct QuizAnswerRequest {
    pub question_id: Uuid,
    pub selected_answer: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitQuizRequest {
    pub answers: Vec<QuizAnswerRequest>,
    #[serde(default)]
    pub time_taken_minutes: i32,
}

#[utoipa::path(
    post,
    path = "/lessons/{id}/start",
    tag = "progress",
    params(("id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson tracking started", body = LessonStarted),
        (status = 404, description = "Student or lesson not found")
    ),
    security(("token" = []))
)]
pub async fn start_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<LessonStarted> {
    let started = state.progress.start_lesson(user.id, lesson_id).await?;
    ok("Lesson tracking started", started)
}

#[utoipa::path(
    post,
    path = "/lessons/{id}/progress",
    tag = "progress",
    params(("id" = Uuid, Path, description = "Lesson id")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress updated successfully", body = LessonProgressView),
        (status = 400, description = "Percentage out of range"),
        (status = 404, description = "Progress record not found")
    ),
    security(("token" = []))
)]
pub async fn update_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateProgressRequest>,
) -> ApiResult<LessonProgressView> {
    let progress = state
        .progress
        .update_lesson_progress(user.id, lesson_id, req.completion_percentage, req.time_spent)
        .await?;
    ok("Progress updated successfully", progress)
}

#[utoipa::path(
    post,
    path = "/quizzes/{id}/attempts",
    tag = "progress",
    params(("id" = Uuid, Path, description = "Quiz id")),
    request_body = SubmitQuizRequest,
    responses(
        (status = 200, description = "Quiz submitted successfully", body = QuizResult),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Quiz not found"),
        (status = 409, description = "Maximum attempts reached")
    ),
    security(("token" = []))
)]
pub async fn submit_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
    ApiJson(req): ApiJson<SubmitQuizRequest>,
) -> ApiResult<QuizResult> {
    require_permission(&user, Permission::TakeQuiz)?;
    let answers = req
        .answers
        .into_iter()
        .map(|a| SubmittedAnswer {
            question_id: a.question_id,
            selected_answer: a.selected_answer,
        })
        .collect();
    let result = state
        .progress
        .submit_quiz(user.id, quiz_id, answers, req.time_taken_minutes)
        .await?;
    ok("Quiz submitted successfully", result)
}

#[utoipa::path(
    get,
    path = "/courses/{id}/progress",
    tag = "progress",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "The caller's progress in the course", body = CourseProgressView),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Not enrolled in this course")
    ),
    security(("token" = []))
)]
pub async fn course_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<CourseProgressView> {
    require_permission(&user, Permission::ViewProgress)?;
    let progress = state.progress.get_course_progress(user.id, course_id).await?;
    with_data(progress)
}
