//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the repository ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::domain::{
    Answer, ChatMessage, ConferenceParticipant, ConferenceRecording, ConferenceRoom, Course,
    Enrollment, Lesson, LessonProgress, Module, NewCourse, NewLesson, NewQuiz, NewUser,
    ParseEnumError, Question, QuestionType, Quiz, QuizAnswer, QuizAttempt, User, UserCredentials,
};
use lms_core::ports::{
    ConferenceRepository, CourseRepository, PortError, PortResult, ProgressRepository,
    UserRepository,
};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every repository port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

/// Maps a sqlx error onto the port error space. `what` names the missing item
/// when the query found no row.
fn port_err(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(db.constraint().unwrap_or("unique constraint").to_string())
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    port_err(e, || "row".to_string())
}

fn parse<T: FromStr<Err = ParseEnumError>>(value: &str) -> PortResult<T> {
    value
        .parse()
        .map_err(|e: ParseEnumError| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    hashed_password: String,
    role: String,
    first_name: String,
    last_name: String,
    phone_number: Option<String>,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_credentials(self) -> PortResult<UserCredentials> {
        Ok(UserCredentials {
            user: User {
                id: self.id,
                username: self.username,
                email: self.email,
                role: parse(&self.role)?,
                first_name: self.first_name,
                last_name: self.last_name,
                phone_number: self.phone_number,
                is_verified: self.is_verified,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            hashed_password: self.hashed_password,
        })
    }

    fn to_domain(self) -> PortResult<User> {
        Ok(self.to_credentials()?.user)
    }
}

const USER_COLUMNS: &str = "id, username, email, hashed_password, role, first_name, last_name, \
     phone_number, is_verified, created_at, updated_at";

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    instructor_id: Uuid,
    title: String,
    description: String,
    category: String,
    price: f64,
    duration_hours: i32,
    difficulty_level: String,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> PortResult<Course> {
        Ok(Course {
            id: self.id,
            instructor_id: self.instructor_id,
            title: self.title,
            description: self.description,
            category: self.category,
            price: self.price,
            duration_hours: self.duration_hours,
            difficulty_level: parse(&self.difficulty_level)?,
            is_published: self.is_published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const COURSE_COLUMNS: &str = "id, instructor_id, title, description, category, price, \
     duration_hours, difficulty_level, is_published, created_at, updated_at";

#[derive(FromRow)]
struct ModuleRecord {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    position: i32,
    created_at: DateTime<Utc>,
}
impl ModuleRecord {
    fn to_domain(self) -> Module {
        Module {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            position: self.position,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content_type: String,
    video_url: Option<String>,
    text_content: Option<String>,
    duration_minutes: i32,
    position: i32,
    is_preview: bool,
    created_at: DateTime<Utc>,
}
impl LessonRecord {
    fn to_domain(self) -> PortResult<Lesson> {
        Ok(Lesson {
            id: self.id,
            module_id: self.module_id,
            title: self.title,
            content_type: parse(&self.content_type)?,
            video_url: self.video_url,
            text_content: self.text_content,
            duration_minutes: self.duration_minutes,
            position: self.position,
            is_preview: self.is_preview,
            created_at: self.created_at,
        })
    }
}

const LESSON_COLUMNS: &str = "id, module_id, title, content_type, video_url, text_content, \
     duration_minutes, position, is_preview, created_at";

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    lesson_id: Uuid,
    title: String,
    description: String,
    passing_score: i32,
    time_limit_minutes: i32,
    attempts_allowed: i32,
    created_at: DateTime<Utc>,
}
impl QuizRecord {
    fn to_domain(self) -> Quiz {
        Quiz {
            id: self.id,
            lesson_id: self.lesson_id,
            title: self.title,
            description: self.description,
            passing_score: self.passing_score,
            time_limit_minutes: self.time_limit_minutes,
            attempts_allowed: self.attempts_allowed,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    quiz_id: Uuid,
    question_text: String,
    question_type: String,
    points: i32,
    position: i32,
    created_at: DateTime<Utc>,
}
impl QuestionRecord {
    fn to_domain(self) -> PortResult<Question> {
        Ok(Question {
            id: self.id,
            quiz_id: self.quiz_id,
            question_text: self.question_text,
            question_type: parse(&self.question_type)?,
            points: self.points,
            position: self.position,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct AnswerRecord {
    id: Uuid,
    question_id: Uuid,
    answer_text: String,
    is_correct: bool,
    position: i32,
}
impl AnswerRecord {
    fn to_domain(self) -> Answer {
        Answer {
            id: self.id,
            question_id: self.question_id,
            answer_text: self.answer_text,
            is_correct: self.is_correct,
            position: self.position,
        }
    }
}

#[derive(FromRow)]
struct EnrollmentRecord {
    id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    progress_percentage: f64,
}
impl EnrollmentRecord {
    fn to_domain(self) -> Enrollment {
        Enrollment {
            id: self.id,
            student_id: self.student_id,
            course_id: self.course_id,
            enrolled_at: self.enrolled_at,
            completed_at: self.completed_at,
            progress_percentage: self.progress_percentage,
        }
    }
}

#[derive(FromRow)]
struct LessonProgressRecord {
    id: Uuid,
    student_id: Uuid,
    lesson_id: Uuid,
    is_completed: bool,
    time_spent_minutes: i32,
    completion_percentage: f64,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    last_accessed: DateTime<Utc>,
}
impl LessonProgressRecord {
    fn to_domain(self) -> LessonProgress {
        LessonProgress {
            id: self.id,
            student_id: self.student_id,
            lesson_id: self.lesson_id,
            is_completed: self.is_completed,
            time_spent_minutes: self.time_spent_minutes,
            completion_percentage: self.completion_percentage,
            started_at: self.started_at,
            completed_at: self.completed_at,
            last_accessed: self.last_accessed,
        }
    }
}

#[derive(FromRow)]
struct RoomRecord {
    id: Uuid,
    title: String,
    description: String,
    host_id: Uuid,
    course_id: Option<Uuid>,
    scheduled_start: DateTime<Utc>,
    scheduled_end: DateTime<Utc>,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    status: String,
    max_participants: i32,
    is_recorded: bool,
    recording_url: Option<String>,
    meeting_url: String,
    meeting_password: String,
    created_at: DateTime<Utc>,
}
impl RoomRecord {
    fn to_domain(self) -> PortResult<ConferenceRoom> {
        Ok(ConferenceRoom {
            id: self.id,
            title: self.title,
            description: self.description,
            host_id: self.host_id,
            course_id: self.course_id,
            scheduled_start: self.scheduled_start,
            scheduled_end: self.scheduled_end,
            actual_start: self.actual_start,
            actual_end: self.actual_end,
            status: parse(&self.status)?,
            max_participants: self.max_participants,
            is_recorded: self.is_recorded,
            recording_url: self.recording_url,
            meeting_url: self.meeting_url,
            meeting_password: self.meeting_password,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ParticipantRecord {
    id: Uuid,
    conference_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: Option<DateTime<Utc>>,
    left_at: Option<DateTime<Utc>>,
    duration_minutes: i32,
    is_invited: bool,
    invitation_sent: bool,
}
impl ParticipantRecord {
    fn to_domain(self) -> PortResult<ConferenceParticipant> {
        Ok(ConferenceParticipant {
            id: self.id,
            conference_id: self.conference_id,
            user_id: self.user_id,
            role: parse(&self.role)?,
            joined_at: self.joined_at,
            left_at: self.left_at,
            duration_minutes: self.duration_minutes,
            is_invited: self.is_invited,
            invitation_sent: self.invitation_sent,
        })
    }
}

const PARTICIPANT_COLUMNS: &str = "id, conference_id, user_id, role, joined_at, left_at, \
     duration_minutes, is_invited, invitation_sent";

#[derive(FromRow)]
struct RecordingRecord {
    id: Uuid,
    conference_id: Uuid,
    recording_id: String,
    file_url: String,
    file_size_mb: f64,
    duration_minutes: i32,
    is_public: bool,
    download_count: i32,
    created_at: DateTime<Utc>,
}
impl RecordingRecord {
    fn to_domain(self) -> ConferenceRecording {
        ConferenceRecording {
            id: self.id,
            conference_id: self.conference_id,
            recording_id: self.recording_id,
            file_url: self.file_url,
            file_size_mb: self.file_size_mb,
            duration_minutes: self.duration_minutes,
            is_public: self.is_public,
            download_count: self.download_count,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ChatMessageRecord {
    id: Uuid,
    conference_id: Uuid,
    sender_id: Uuid,
    message: String,
    is_private: bool,
    recipient_id: Option<Uuid>,
    sent_at: DateTime<Utc>,
}
impl ChatMessageRecord {
    fn to_domain(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            conference_id: self.conference_id,
            sender_id: self.sender_id,
            message: self.message,
            is_private: self.is_private,
            recipient_id: self.recipient_id,
            sent_at: self.sent_at,
        }
    }
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, email, hashed_password, role, first_name, last_name, phone_number) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .bind(new_user.role.as_str())
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.phone_number)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        Ok(self.get_credentials(user_id).await?.user)
    }

    async fn get_credentials(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_err(e, || format!("User {} not found", user_id)))?
            .to_credentials()
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_err(e, || format!("User {} not found", username)))?
            .to_credentials()
    }

    async fn username_exists(&self, username: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn find_user_id_by_email(&self, email: &str) -> PortResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET hashed_password = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(hashed_password)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn save_user(&self, user: &User) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET email = $1, first_name = $2, last_name = $3, phone_number = $4, \
             updated_at = NOW() WHERE id = $5 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone_number)
            .bind(user.id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_err(e, || format!("User {} not found", user.id)))?
            .to_domain()
    }
}

//=========================================================================================
// `CourseRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseRepository for DbAdapter {
    async fn create_course(&self, new_course: NewCourse) -> PortResult<Course> {
        let sql = format!(
            "INSERT INTO courses (id, instructor_id, title, description, category, price, duration_hours, difficulty_level) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(new_course.instructor_id)
            .bind(&new_course.title)
            .bind(&new_course.description)
            .bind(&new_course.category)
            .bind(new_course.price)
            .bind(new_course.duration_hours)
            .bind(new_course.difficulty_level.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_err(e, || format!("Course {} not found", course_id)))?
            .to_domain()
    }

    async fn set_course_published(&self, course_id: Uuid, published: bool) -> PortResult<Course> {
        let sql = format!(
            "UPDATE courses SET is_published = $1, updated_at = NOW() WHERE id = $2 RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(published)
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_err(e, || format!("Course {} not found", course_id)))?
            .to_domain()
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at ASC");
        let records = sqlx::query_as::<_, CourseRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_courses_by_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE instructor_id = $1 ORDER BY created_at ASC"
        );
        let records = sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(instructor_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_module(
        &self,
        course_id: Uuid,
        title: &str,
        description: &str,
        position: i32,
    ) -> PortResult<Module> {
        let record = sqlx::query_as::<_, ModuleRecord>(
            "INSERT INTO modules (id, course_id, title, description, position) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, course_id, title, description, position, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(title)
        .bind(description)
        .bind(position)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_module(&self, module_id: Uuid) -> PortResult<Module> {
        let record = sqlx::query_as::<_, ModuleRecord>(
            "SELECT id, course_id, title, description, position, created_at FROM modules WHERE id = $1",
        )
        .bind(module_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_err(e, || format!("Module {} not found", module_id)))?;
        Ok(record.to_domain())
    }

    async fn list_modules(&self, course_id: Uuid) -> PortResult<Vec<Module>> {
        let records = sqlx::query_as::<_, ModuleRecord>(
            "SELECT id, course_id, title, description, position, created_at FROM modules \
             WHERE course_id = $1 ORDER BY position ASC, created_at ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_lesson(&self, new_lesson: NewLesson) -> PortResult<Lesson> {
        let sql = format!(
            "INSERT INTO lessons (id, module_id, title, content_type, video_url, text_content, duration_minutes, position, is_preview) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {LESSON_COLUMNS}"
        );
        sqlx::query_as::<_, LessonRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(new_lesson.module_id)
            .bind(&new_lesson.title)
            .bind(new_lesson.content_type.as_str())
            .bind(&new_lesson.video_url)
            .bind(&new_lesson.text_content)
            .bind(new_lesson.duration_minutes)
            .bind(new_lesson.position)
            .bind(new_lesson.is_preview)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1");
        sqlx::query_as::<_, LessonRecord>(&sql)
            .bind(lesson_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_err(e, || format!("Lesson {} not found", lesson_id)))?
            .to_domain()
    }

    async fn list_lessons(&self, module_id: Uuid) -> PortResult<Vec<Lesson>> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE module_id = $1 ORDER BY position ASC, created_at ASC"
        );
        let records = sqlx::query_as::<_, LessonRecord>(&sql)
            .bind(module_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn course_id_for_lesson(&self, lesson_id: Uuid) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT m.course_id FROM lessons l JOIN modules m ON m.id = l.module_id WHERE l.id = $1",
        )
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_err(e, || format!("Lesson {} not found", lesson_id)))
    }

    async fn count_lessons_in_course(&self, course_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lessons l JOIN modules m ON m.id = l.module_id WHERE m.course_id = $1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn create_quiz(&self, new_quiz: NewQuiz) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(
            "INSERT INTO quizzes (id, lesson_id, title, description, passing_score, time_limit_minutes, attempts_allowed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, lesson_id, title, description, passing_score, time_limit_minutes, attempts_allowed, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(new_quiz.lesson_id)
        .bind(&new_quiz.title)
        .bind(&new_quiz.description)
        .bind(new_quiz.passing_score)
        .bind(new_quiz.time_limit_minutes)
        .bind(new_quiz.attempts_allowed)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(
            "SELECT id, lesson_id, title, description, passing_score, time_limit_minutes, attempts_allowed, created_at \
             FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_err(e, || format!("Quiz {} not found", quiz_id)))?;
        Ok(record.to_domain())
    }

    async fn create_question(
        &self,
        quiz_id: Uuid,
        question_text: &str,
        question_type: QuestionType,
        points: i32,
        position: i32,
    ) -> PortResult<Question> {
        sqlx::query_as::<_, QuestionRecord>(
            "INSERT INTO questions (id, quiz_id, question_text, question_type, points, position) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, quiz_id, question_text, question_type, points, position, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(quiz_id)
        .bind(question_text)
        .bind(question_type.as_str())
        .bind(points)
        .bind(position)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?
        .to_domain()
    }

    async fn create_answer(
        &self,
        question_id: Uuid,
        answer_text: &str,
        is_correct: bool,
        position: i32,
    ) -> PortResult<Answer> {
        let record = sqlx::query_as::<_, AnswerRecord>(
            "INSERT INTO answers (id, question_id, answer_text, is_correct, position) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id, question_id, answer_text, is_correct, position",
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(answer_text)
        .bind(is_correct)
        .bind(position)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_questions(&self, quiz_id: Uuid) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT id, quiz_id, question_text, question_type, points, position, created_at \
             FROM questions WHERE quiz_id = $1 ORDER BY position ASC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_answers(&self, question_id: Uuid) -> PortResult<Vec<Answer>> {
        let records = sqlx::query_as::<_, AnswerRecord>(
            "SELECT id, question_id, answer_text, is_correct, position FROM answers \
             WHERE question_id = $1 ORDER BY position ASC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let record = sqlx::query_as::<_, EnrollmentRecord>(
            "INSERT INTO enrollments (id, student_id, course_id) VALUES ($1, $2, $3) \
             ON CONFLICT (student_id, course_id) DO NOTHING \
             RETURNING id, student_id, course_id, enrolled_at, completed_at, progress_percentage",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn get_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let record = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT id, student_id, course_id, enrolled_at, completed_at, progress_percentage \
             FROM enrollments WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_enrollments_for_student(&self, student_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let records = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT id, student_id, course_id, enrolled_at, completed_at, progress_percentage \
             FROM enrollments WHERE student_id = $1 ORDER BY enrolled_at ASC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_enrollments(&self, course_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn save_enrollment(&self, enrollment: &Enrollment) -> PortResult<()> {
        sqlx::query(
            "UPDATE enrollments SET progress_percentage = $1, completed_at = $2 WHERE id = $3",
        )
        .bind(enrollment.progress_percentage)
        .bind(enrollment.completed_at)
        .bind(enrollment.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `ProgressRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressRepository for DbAdapter {
    async fn get_or_create_lesson_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> PortResult<LessonProgress> {
        sqlx::query(
            "INSERT INTO lesson_progress (id, student_id, lesson_id) VALUES ($1, $2, $3) \
             ON CONFLICT (student_id, lesson_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(lesson_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        self.get_lesson_progress(student_id, lesson_id)
            .await?
            .ok_or_else(|| {
                PortError::NotFound(format!(
                    "Progress for student {} on lesson {} not found",
                    student_id, lesson_id
                ))
            })
    }

    async fn get_lesson_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> PortResult<Option<LessonProgress>> {
        let record = sqlx::query_as::<_, LessonProgressRecord>(
            "SELECT id, student_id, lesson_id, is_completed, time_spent_minutes, completion_percentage, \
             started_at, completed_at, last_accessed FROM lesson_progress WHERE student_id = $1 AND lesson_id = $2",
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn save_lesson_progress(&self, progress: &LessonProgress) -> PortResult<()> {
        sqlx::query(
            "UPDATE lesson_progress SET is_completed = $1, time_spent_minutes = $2, completion_percentage = $3, \
             completed_at = $4, last_accessed = $5 WHERE id = $6",
        )
        .bind(progress.is_completed)
        .bind(progress.time_spent_minutes)
        .bind(progress.completion_percentage)
        .bind(progress.completed_at)
        .bind(progress.last_accessed)
        .bind(progress.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn count_completed_lessons_in_course(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lesson_progress p \
             JOIN lessons l ON l.id = p.lesson_id JOIN modules m ON m.id = l.module_id \
             WHERE p.student_id = $1 AND m.course_id = $2 AND p.is_completed",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn total_minutes_in_course(&self, student_id: Uuid, course_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(p.time_spent_minutes), 0)::BIGINT FROM lesson_progress p \
             JOIN lessons l ON l.id = p.lesson_id JOIN modules m ON m.id = l.module_id \
             WHERE p.student_id = $1 AND m.course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn count_quiz_attempts(&self, student_id: Uuid, quiz_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2",
        )
        .bind(student_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn save_quiz_attempt(&self, attempt: &QuizAttempt) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO quiz_attempts (id, student_id, quiz_id, score, total_points, is_passed, \
             time_taken_minutes, attempt_number, started_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(attempt.id)
        .bind(attempt.student_id)
        .bind(attempt.quiz_id)
        .bind(attempt.score)
        .bind(attempt.total_points)
        .bind(attempt.is_passed)
        .bind(attempt.time_taken_minutes)
        .bind(attempt.attempt_number)
        .bind(attempt.started_at)
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn save_quiz_answer(&self, answer: &QuizAnswer) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO quiz_answers (id, attempt_id, question_id, selected_answer, is_correct, points_earned) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(answer.id)
        .bind(answer.attempt_id)
        .bind(answer.question_id)
        .bind(&answer.selected_answer)
        .bind(answer.is_correct)
        .bind(answer.points_earned)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `ConferenceRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConferenceRepository for DbAdapter {
    async fn create_room(&self, room: &ConferenceRoom) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO conference_rooms (id, title, description, host_id, course_id, scheduled_start, \
             scheduled_end, status, max_participants, is_recorded, meeting_url, meeting_password, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(room.id)
        .bind(&room.title)
        .bind(&room.description)
        .bind(room.host_id)
        .bind(room.course_id)
        .bind(room.scheduled_start)
        .bind(room.scheduled_end)
        .bind(room.status.as_str())
        .bind(room.max_participants)
        .bind(room.is_recorded)
        .bind(&room.meeting_url)
        .bind(&room.meeting_password)
        .bind(room.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_room(&self, room_id: Uuid) -> PortResult<ConferenceRoom> {
        sqlx::query_as::<_, RoomRecord>(
            "SELECT id, title, description, host_id, course_id, scheduled_start, scheduled_end, actual_start, \
             actual_end, status, max_participants, is_recorded, recording_url, meeting_url, meeting_password, \
             created_at FROM conference_rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_err(e, || format!("Room {} not found", room_id)))?
        .to_domain()
    }

    async fn save_room(&self, room: &ConferenceRoom) -> PortResult<()> {
        sqlx::query(
            "UPDATE conference_rooms SET status = $1, actual_start = $2, actual_end = $3, recording_url = $4 \
             WHERE id = $5",
        )
        .bind(room.status.as_str())
        .bind(room.actual_start)
        .bind(room.actual_end)
        .bind(&room.recording_url)
        .bind(room.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_participant(&self, participant: &ConferenceParticipant) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO conference_participants (id, conference_id, user_id, role, joined_at, left_at, \
             duration_minutes, is_invited, invitation_sent) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (conference_id, user_id) DO NOTHING",
        )
        .bind(participant.id)
        .bind(participant.conference_id)
        .bind(participant.user_id)
        .bind(participant.role.as_str())
        .bind(participant.joined_at)
        .bind(participant.left_at)
        .bind(participant.duration_minutes)
        .bind(participant.is_invited)
        .bind(participant.invitation_sent)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ConferenceParticipant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM conference_participants WHERE conference_id = $1 AND user_id = $2"
        );
        let record = sqlx::query_as::<_, ParticipantRecord>(&sql)
            .bind(room_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn save_participant(&self, participant: &ConferenceParticipant) -> PortResult<()> {
        sqlx::query(
            "UPDATE conference_participants SET role = $1, joined_at = $2, left_at = $3, duration_minutes = $4, \
             is_invited = $5, invitation_sent = $6 WHERE id = $7",
        )
        .bind(participant.role.as_str())
        .bind(participant.joined_at)
        .bind(participant.left_at)
        .bind(participant.duration_minutes)
        .bind(participant.is_invited)
        .bind(participant.invitation_sent)
        .bind(participant.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_participants(&self, room_id: Uuid) -> PortResult<Vec<ConferenceParticipant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM conference_participants WHERE conference_id = $1"
        );
        let records = sqlx::query_as::<_, ParticipantRecord>(&sql)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn count_participants(&self, room_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conference_participants WHERE conference_id = $1",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn create_recording(&self, recording: &ConferenceRecording) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO conference_recordings (id, conference_id, recording_id, file_url, file_size_mb, \
             duration_minutes, is_public, download_count, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(recording.id)
        .bind(recording.conference_id)
        .bind(&recording.recording_id)
        .bind(&recording.file_url)
        .bind(recording.file_size_mb)
        .bind(recording.duration_minutes)
        .bind(recording.is_public)
        .bind(recording.download_count)
        .bind(recording.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_recordings(&self, room_id: Uuid) -> PortResult<Vec<ConferenceRecording>> {
        let records = sqlx::query_as::<_, RecordingRecord>(
            "SELECT id, conference_id, recording_id, file_url, file_size_mb, duration_minutes, is_public, \
             download_count, created_at FROM conference_recordings WHERE conference_id = $1 ORDER BY created_at ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_chat_message(&self, message: &ChatMessage) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, conference_id, sender_id, message, is_private, recipient_id, sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(message.id)
        .bind(message.conference_id)
        .bind(message.sender_id)
        .bind(&message.message)
        .bind(message.is_private)
        .bind(message.recipient_id)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_chat_messages(&self, room_id: Uuid) -> PortResult<Vec<ChatMessage>> {
        let records = sqlx::query_as::<_, ChatMessageRecord>(
            "SELECT id, conference_id, sender_id, message, is_private, recipient_id, sent_at \
             FROM chat_messages WHERE conference_id = $1 ORDER BY sent_at ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
