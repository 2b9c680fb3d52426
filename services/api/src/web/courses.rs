//! services/api/src/web/courses.rs
//!
//! Course authoring, enrollment and content endpoints.

use axum::{
    extract::{Path, State},
    Extension,
};
use lms_core::access::Permission;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::courses::{
    AnswerDraft, CourseContent, CourseCreated, CourseDraft, CoursePublication, LessonCreated,
    LessonDraft, ModuleCreated, QuestionCreated, QuestionDraft, QuizCreated, QuizDraft,
    UserCourses,
};
use crate::services::AuthUser;
use crate::web::middleware::require_permission;
use crate::web::rest::{ok, with_data, ApiJson, ApiResult, Empty};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<f64>,
    pub duration_hours: Option<i32>,
    pub difficulty_level: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PublishCourseRequest {
    /// Defaults to `true`.
    pub is_published: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddModuleRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct AddLessonRequest {
    pub title: String,
    pub content_type: String,
    pub order: i32,
    pub video_url: Option<String>,
    pub text_content: Option<String>,
    pub duration_minutes: Option<i32>,
    pub is_preview: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateQuizRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub passing_score: Option<i32>,
    pub time_limit_minutes: Option<i32>,
    pub attempts_allowed: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct AddQuestionRequest {
    pub question_text: String,
    pub question_type: String,
    pub points: Option<i32>,
    pub order: i32,
    #[serde(default)]
    pub answers: Vec<AnswerRequest>,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/courses",
    tag = "courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 200, description = "Course created successfully", body = CourseCreated),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Instructor not found")
    ),
    security(("token" = []))
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> ApiResult<CourseCreated> {
    require_permission(&user, Permission::CreateCourse)?;
    let created = state
        .courses
        .create_course(
            user.id,
            CourseDraft {
                title: req.title,
                description: req.description,
                category: req.category,
                price: req.price,
                duration_hours: req.duration_hours,
                difficulty_level: req.difficulty_level,
            },
        )
        .await?;
    ok("Course created successfully", created)
}

#[utoipa::path(
    post,
    path = "/courses/{id}/publish",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = PublishCourseRequest,
    responses(
        (status = 200, description = "Publication flag updated", body = CoursePublication),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Course not found")
    ),
    security(("token" = []))
)]
pub async fn publish_course_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
    ApiJson(req): ApiJson<PublishCourseRequest>,
) -> ApiResult<CoursePublication> {
    let published = req.is_published.unwrap_or(true);
    let publication = state
        .courses
        .publish_course(&user, course_id, published)
        .await?;
    let message = if published {
        "Course published successfully"
    } else {
        "Course unpublished successfully"
    };
    ok(message, publication)
}

#[utoipa::path(
    post,
    path = "/courses/{id}/modules",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = AddModuleRequest,
    responses(
        (status = 200, description = "Module added successfully", body = ModuleCreated),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Course not found")
    ),
    security(("token" = []))
)]
pub async fn add_module_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddModuleRequest>,
) -> ApiResult<ModuleCreated> {
    let created = state
        .courses
        .add_module(&user, course_id, &req.title, &req.description, req.order)
        .await?;
    ok("Module added successfully", created)
}

#[utoipa::path(
    post,
    path = "/modules/{id}/lessons",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Module id")),
    request_body = AddLessonRequest,
    responses(
        (status = 200, description = "Lesson added successfully", body = LessonCreated),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Module not found")
    ),
    security(("token" = []))
)]
pub async fn add_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(module_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddLessonRequest>,
) -> ApiResult<LessonCreated> {
    let created = state
        .courses
        .add_lesson(
            &user,
            module_id,
            LessonDraft {
                title: req.title,
                content_type: req.content_type,
                order: req.order,
                video_url: req.video_url,
                text_content: req.text_content,
                duration_minutes: req.duration_minutes,
                is_preview: req.is_preview,
            },
        )
        .await?;
    ok("Lesson added successfully", created)
}

#[utoipa::path(
    post,
    path = "/lessons/{id}/quizzes",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Lesson id")),
    request_body = CreateQuizRequest,
    responses(
        (status = 200, description = "Quiz created successfully", body = QuizCreated),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Lesson not found")
    ),
    security(("token" = []))
)]
pub async fn create_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateQuizRequest>,
) -> ApiResult<QuizCreated> {
    let created = state
        .courses
        .create_quiz(
            &user,
            lesson_id,
            QuizDraft {
                title: req.title,
                description: req.description,
                passing_score: req.passing_score,
                time_limit_minutes: req.time_limit_minutes,
                attempts_allowed: req.attempts_allowed,
            },
        )
        .await?;
    ok("Quiz created successfully", created)
}

#[utoipa::path(
    post,
    path = "/quizzes/{id}/questions",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Quiz id")),
    request_body = AddQuestionRequest,
    responses(
        (status = 200, description = "Question added successfully", body = QuestionCreated),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Quiz not found")
    ),
    security(("token" = []))
)]
pub async fn add_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddQuestionRequest>,
) -> ApiResult<QuestionCreated> {
    let draft = QuestionDraft {
        question_text: req.question_text,
        question_type: req.question_type,
        points: req.points,
        order: req.order,
        answers: req
            .answers
            .into_iter()
            .map(|a| AnswerDraft {
                text: a.text,
                is_correct: a.is_correct,
            })
            .collect(),
    };
    let created = state.courses.add_question(&user, quiz_id, draft).await?;
    ok("Question added successfully", created)
}

/// POST /courses/{id}/enroll - Enroll the calling student
#[utoipa::path(
    post,
    path = "/courses/{id}/enroll",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Student enrolled successfully"),
        (status = 404, description = "Student not found, or course not found or not published"),
        (status = 409, description = "Student already enrolled")
    ),
    security(("token" = []))
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Empty> {
    require_permission(&user, Permission::ViewCourse)?;
    state.courses.enroll_student(user.id, course_id).await?;
    ok("Student enrolled successfully", Empty {})
}

#[utoipa::path(
    get,
    path = "/courses/{id}/content",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "The module and lesson tree", body = CourseContent),
        (status = 404, description = "Course not found")
    ),
    security(("token" = []))
)]
pub async fn course_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<CourseContent> {
    let content = state
        .courses
        .get_course_content(course_id, Some(&user))
        .await?;
    with_data(content)
}

/// GET /my-courses - Taught, enrolled, or all courses depending on the caller's role
#[utoipa::path(
    get,
    path = "/my-courses",
    tag = "courses",
    responses((status = 200, description = "The caller's courses", body = UserCourses)),
    security(("token" = []))
)]
pub async fn my_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserCourses> {
    let courses = state.courses.get_user_courses(user.id, user.role).await?;
    with_data(courses)
}
