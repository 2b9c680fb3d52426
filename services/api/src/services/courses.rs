//! services/api/src/services/courses.rs
//!
//! Course authoring (course, module, lesson, quiz, question), enrollment, and the
//! course content tree.

use lms_core::{
    access::can_edit_course,
    domain::{
        ContentType, Course, DifficultyLevel, Lesson, NewCourse, NewLesson, NewQuiz,
        QuestionType, Role,
    },
    ports::DatabaseService,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{not_found, ServiceError, ServiceResult};
use crate::services::auth::AuthUser;

//=========================================================================================
// Inputs
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Option<f64>,
    pub duration_hours: Option<i32>,
    pub difficulty_level: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LessonDraft {
    pub title: String,
    pub content_type: String,
    pub order: i32,
    pub video_url: Option<String>,
    pub text_content: Option<String>,
    pub duration_minutes: Option<i32>,
    pub is_preview: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub passing_score: Option<i32>,
    pub time_limit_minutes: Option<i32>,
    pub attempts_allowed: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct AnswerDraft {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub question_text: String,
    pub question_type: String,
    pub points: Option<i32>,
    pub order: i32,
    pub answers: Vec<AnswerDraft>,
}

//=========================================================================================
// Views
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseCreated {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoursePublication {
    pub course_id: Uuid,
    pub is_published: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModuleCreated {
    pub module_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonCreated {
    pub lesson_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizCreated {
    pub quiz_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionCreated {
    pub question_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonOutline {
    pub id: Uuid,
    pub title: String,
    pub content_type: String,
    pub duration_minutes: i32,
    pub order: i32,
    pub is_preview: bool,
    /// False when the lesson body was withheld from the viewer.
    pub content_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModuleOutline {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub lessons: Vec<LessonOutline>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseOutline {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: String,
    pub difficulty_level: String,
    pub modules: Vec<ModuleOutline>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseContent {
    pub course: CourseOutline,
}

/// One row of `/my-courses`. Which fields are present depends on the caller's role.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct CourseListing {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollments_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCourses {
    pub courses: Vec<CourseListing>,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

//=========================================================================================
// The Service
//=========================================================================================

#[derive(Clone)]
pub struct CourseService {
    db: Arc<dyn DatabaseService>,
}

impl CourseService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    fn ensure_can_edit(actor: &AuthUser, course: &Course) -> ServiceResult<()> {
        if can_edit_course(actor.role, actor.id, course.instructor_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Permission denied".to_string()))
        }
    }

    async fn editable_course(&self, actor: &AuthUser, course_id: Uuid) -> ServiceResult<Course> {
        let course = self
            .db
            .get_course(course_id)
            .await
            .map_err(not_found("Course not found"))?;
        Self::ensure_can_edit(actor, &course)?;
        Ok(course)
    }

    async fn instructor_name(&self, instructor_id: Uuid) -> ServiceResult<String> {
        Ok(self.db.get_user(instructor_id).await?.username)
    }

    pub async fn create_course(
        &self,
        instructor_id: Uuid,
        draft: CourseDraft,
    ) -> ServiceResult<CourseCreated> {
        let instructor = self
            .db
            .get_user(instructor_id)
            .await
            .map_err(not_found("Instructor not found"))?;
        if !matches!(instructor.role, Role::Instructor | Role::Admin) {
            return Err(ServiceError::NotFound("Instructor not found".to_string()));
        }
        if draft.title.trim().is_empty() {
            return Err(ServiceError::Invalid("Title is required".to_string()));
        }
        let price = draft.price.unwrap_or(0.0);
        if price < 0.0 {
            return Err(ServiceError::Invalid("Price must not be negative".to_string()));
        }
        let difficulty_level = match draft.difficulty_level.as_deref() {
            None => DifficultyLevel::default(),
            Some(raw) => raw
                .parse()
                .map_err(|_| ServiceError::Invalid("Invalid difficulty level".to_string()))?,
        };

        let course = self
            .db
            .create_course(NewCourse {
                instructor_id,
                title: draft.title,
                description: draft.description,
                category: draft.category,
                price,
                duration_hours: draft.duration_hours.unwrap_or(0),
                difficulty_level,
            })
            .await?;
        info!("Course {} created by {}", course.id, instructor.username);
        Ok(CourseCreated {
            course_id: course.id,
        })
    }

    pub async fn publish_course(
        &self,
        actor: &AuthUser,
        course_id: Uuid,
        published: bool,
    ) -> ServiceResult<CoursePublication> {
        self.editable_course(actor, course_id).await?;
        let course = self
            .db
            .set_course_published(course_id, published)
            .await
            .map_err(not_found("Course not found"))?;
        info!("Course {} published={}", course.id, course.is_published);
        Ok(CoursePublication {
            course_id: course.id,
            is_published: course.is_published,
        })
    }

    pub async fn add_module(
        &self,
        actor: &AuthUser,
        course_id: Uuid,
        title: &str,
        description: &str,
        order: i32,
    ) -> ServiceResult<ModuleCreated> {
        self.editable_course(actor, course_id).await?;
        let module = self
            .db
            .create_module(course_id, title, description, order)
            .await
            .map_err(not_found("Course not found"))?;
        Ok(ModuleCreated {
            module_id: module.id,
        })
    }

    pub async fn add_lesson(
        &self,
        actor: &AuthUser,
        module_id: Uuid,
        draft: LessonDraft,
    ) -> ServiceResult<LessonCreated> {
        let module = self
            .db
            .get_module(module_id)
            .await
            .map_err(not_found("Module not found"))?;
        self.editable_course(actor, module.course_id).await?;
        let content_type: ContentType = draft
            .content_type
            .parse()
            .map_err(|_| ServiceError::Invalid("Invalid content type".to_string()))?;

        let lesson = self
            .db
            .create_lesson(NewLesson {
                module_id,
                title: draft.title,
                content_type,
                video_url: draft.video_url,
                text_content: draft.text_content,
                duration_minutes: draft.duration_minutes.unwrap_or(0),
                position: draft.order,
                is_preview: draft.is_preview.unwrap_or(false),
            })
            .await
            .map_err(not_found("Module not found"))?;
        Ok(LessonCreated {
            lesson_id: lesson.id,
        })
    }

    pub async fn create_quiz(
        &self,
        actor: &AuthUser,
        lesson_id: Uuid,
        draft: QuizDraft,
    ) -> ServiceResult<QuizCreated> {
        let course_id = self
            .db
            .course_id_for_lesson(lesson_id)
            .await
            .map_err(not_found("Lesson not found"))?;
        self.editable_course(actor, course_id).await?;

        let passing_score = draft.passing_score.unwrap_or(70);
        if !(0..=100).contains(&passing_score) {
            return Err(ServiceError::Invalid(
                "Passing score must be between 0 and 100".to_string(),
            ));
        }
        let attempts_allowed = draft.attempts_allowed.unwrap_or(3);
        if attempts_allowed < 1 {
            return Err(ServiceError::Invalid(
                "At least one attempt must be allowed".to_string(),
            ));
        }

        let quiz = self
            .db
            .create_quiz(NewQuiz {
                lesson_id,
                title: draft.title,
                description: draft.description,
                passing_score,
                time_limit_minutes: draft.time_limit_minutes.unwrap_or(30),
                attempts_allowed,
            })
            .await
            .map_err(not_found("Lesson not found"))?;
        Ok(QuizCreated { quiz_id: quiz.id })
    }

    /// Adds a question and then its answers, numbered from 1 in the given order.
    /// The inserts are independent; a failure part-way leaves the earlier rows.
    pub async fn add_question(
        &self,
        actor: &AuthUser,
        quiz_id: Uuid,
        draft: QuestionDraft,
    ) -> ServiceResult<QuestionCreated> {
        let quiz = self
            .db
            .get_quiz(quiz_id)
            .await
            .map_err(not_found("Quiz not found"))?;
        let course_id = self.db.course_id_for_lesson(quiz.lesson_id).await?;
        self.editable_course(actor, course_id).await?;

        let question_type: QuestionType = draft
            .question_type
            .parse()
            .map_err(|_| ServiceError::Invalid("Invalid question type".to_string()))?;

        let points = draft.points.unwrap_or(1);
        if points < 1 {
            return Err(ServiceError::Invalid("Points must be positive".to_string()));
        }

        let question = self
            .db
            .create_question(
                quiz_id,
                &draft.question_text,
                question_type,
                points,
                draft.order,
            )
            .await
            .map_err(not_found("Quiz not found"))?;

        for (idx, answer) in draft.answers.iter().enumerate() {
            self.db
                .create_answer(question.id, &answer.text, answer.is_correct, idx as i32 + 1)
                .await?;
        }

        Ok(QuestionCreated {
            question_id: question.id,
        })
    }

    pub async fn enroll_student(&self, student_id: Uuid, course_id: Uuid) -> ServiceResult<()> {
        let student = self
            .db
            .get_user(student_id)
            .await
            .map_err(not_found("Student not found"))?;
        if student.role != Role::Student {
            return Err(ServiceError::NotFound("Student not found".to_string()));
        }
        let course = self
            .db
            .get_course(course_id)
            .await
            .map_err(not_found("Course not found or not published"))?;
        if !course.is_published {
            return Err(ServiceError::NotFound(
                "Course not found or not published".to_string(),
            ));
        }

        match self.db.create_enrollment(student_id, course_id).await? {
            Some(_) => {
                info!("Student {} enrolled in course {}", student_id, course_id);
                Ok(())
            }
            None => {
                debug!("Student {} already enrolled in {}", student_id, course_id);
                Err(ServiceError::Conflict("Student already enrolled".to_string()))
            }
        }
    }

    /// Walks modules and lessons in order. Lesson bodies are included for previews,
    /// enrolled students, the course's instructor, and admins.
    pub async fn get_course_content(
        &self,
        course_id: Uuid,
        viewer: Option<&AuthUser>,
    ) -> ServiceResult<CourseContent> {
        let course = self
            .db
            .get_course(course_id)
            .await
            .map_err(not_found("Course not found"))?;

        let full_access = match viewer {
            None => false,
            Some(user) if user.role == Role::Admin || user.id == course.instructor_id => true,
            Some(user) => self.db.get_enrollment(user.id, course.id).await?.is_some(),
        };
        let may_see = |lesson: &Lesson| viewer.is_some() && (lesson.is_preview || full_access);

        let mut modules = Vec::new();
        for module in self.db.list_modules(course.id).await? {
            let lessons = self
                .db
                .list_lessons(module.id)
                .await?
                .into_iter()
                .map(|lesson| {
                    let visible = may_see(&lesson);
                    LessonOutline {
                        id: lesson.id,
                        title: lesson.title,
                        content_type: lesson.content_type.to_string(),
                        duration_minutes: lesson.duration_minutes,
                        order: lesson.position,
                        is_preview: lesson.is_preview,
                        content_available: visible,
                        video_url: lesson.video_url.filter(|_| visible),
                        text_content: lesson.text_content.filter(|_| visible),
                    }
                })
                .collect();
            modules.push(ModuleOutline {
                id: module.id,
                title: module.title,
                description: module.description,
                order: module.position,
                lessons,
            });
        }

        Ok(CourseContent {
            course: CourseOutline {
                id: course.id,
                title: course.title,
                description: course.description,
                instructor: self.instructor_name(course.instructor_id).await?,
                category: course.category,
                difficulty_level: course.difficulty_level.to_string(),
                modules,
            },
        })
    }

    pub async fn get_user_courses(&self, user_id: Uuid, role: Role) -> ServiceResult<UserCourses> {
        let user = self
            .db
            .get_user(user_id)
            .await
            .map_err(not_found("User not found"))?;

        let mut courses = Vec::new();
        match role {
            Role::Instructor => {
                for course in self.db.list_courses_by_instructor(user.id).await? {
                    courses.push(CourseListing {
                        id: course.id,
                        enrollments_count: Some(self.db.count_enrollments(course.id).await?),
                        title: course.title,
                        description: Some(course.description),
                        category: Some(course.category),
                        is_published: Some(course.is_published),
                        created_at: Some(course.created_at.format(DATE_FORMAT).to_string()),
                        ..Default::default()
                    });
                }
            }
            Role::Student => {
                for enrollment in self.db.list_enrollments_for_student(user.id).await? {
                    let course = self.db.get_course(enrollment.course_id).await?;
                    courses.push(CourseListing {
                        id: course.id,
                        instructor: Some(self.instructor_name(course.instructor_id).await?),
                        title: course.title,
                        description: Some(course.description),
                        progress_percentage: Some(enrollment.progress_percentage),
                        enrolled_at: Some(enrollment.enrolled_at.format(DATE_FORMAT).to_string()),
                        ..Default::default()
                    });
                }
            }
            Role::Admin => {
                for course in self.db.list_courses().await? {
                    courses.push(CourseListing {
                        id: course.id,
                        instructor: Some(self.instructor_name(course.instructor_id).await?),
                        enrollments_count: Some(self.db.count_enrollments(course.id).await?),
                        title: course.title,
                        category: Some(course.category),
                        is_published: Some(course.is_published),
                        ..Default::default()
                    });
                }
            }
        }

        Ok(UserCourses { courses })
    }
}
