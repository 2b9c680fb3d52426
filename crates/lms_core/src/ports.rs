//! crates/lms_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Answer, ChatMessage, ConferenceParticipant, ConferenceRecording, ConferenceRoom, Course,
    Enrollment, Lesson, LessonProgress, Module, NewCourse, NewLesson, NewQuiz, NewUser, Question,
    QuestionType, Quiz, QuizAnswer, QuizAttempt, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Repository Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. Fails with `Conflict` if the username or email is taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_credentials(&self, user_id: Uuid) -> PortResult<UserCredentials>;

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn username_exists(&self, username: &str) -> PortResult<bool>;

    async fn find_user_id_by_email(&self, email: &str) -> PortResult<Option<Uuid>>;

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    /// Persists profile fields and bumps `updated_at`.
    async fn save_user(&self, user: &User) -> PortResult<User>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    // --- Courses ---
    async fn create_course(&self, new_course: NewCourse) -> PortResult<Course>;

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    async fn set_course_published(&self, course_id: Uuid, published: bool) -> PortResult<Course>;

    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    async fn list_courses_by_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<Course>>;

    // --- Modules and Lessons ---
    async fn create_module(
        &self,
        course_id: Uuid,
        title: &str,
        description: &str,
        position: i32,
    ) -> PortResult<Module>;

    async fn get_module(&self, module_id: Uuid) -> PortResult<Module>;

    /// Modules of a course in display order.
    async fn list_modules(&self, course_id: Uuid) -> PortResult<Vec<Module>>;

    async fn create_lesson(&self, new_lesson: NewLesson) -> PortResult<Lesson>;

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson>;

    /// Lessons of a module in display order.
    async fn list_lessons(&self, module_id: Uuid) -> PortResult<Vec<Lesson>>;

    async fn course_id_for_lesson(&self, lesson_id: Uuid) -> PortResult<Uuid>;

    async fn count_lessons_in_course(&self, course_id: Uuid) -> PortResult<i64>;

    // --- Quizzes ---
    async fn create_quiz(&self, new_quiz: NewQuiz) -> PortResult<Quiz>;

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz>;

    async fn create_question(
        &self,
        quiz_id: Uuid,
        question_text: &str,
        question_type: QuestionType,
        points: i32,
        position: i32,
    ) -> PortResult<Question>;

    async fn create_answer(
        &self,
        question_id: Uuid,
        answer_text: &str,
        is_correct: bool,
        position: i32,
    ) -> PortResult<Answer>;

    async fn list_questions(&self, quiz_id: Uuid) -> PortResult<Vec<Question>>;

    async fn list_answers(&self, question_id: Uuid) -> PortResult<Vec<Answer>>;

    // --- Enrollments ---
    /// Inserts the (student, course) pair. Returns `None` if it already exists.
    async fn create_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>>;

    async fn get_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>>;

    async fn list_enrollments_for_student(&self, student_id: Uuid) -> PortResult<Vec<Enrollment>>;

    async fn count_enrollments(&self, course_id: Uuid) -> PortResult<i64>;

    async fn save_enrollment(&self, enrollment: &Enrollment) -> PortResult<()>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Returns the (student, lesson) row, inserting a fresh one if none exists.
    async fn get_or_create_lesson_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> PortResult<LessonProgress>;

    async fn get_lesson_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> PortResult<Option<LessonProgress>>;

    async fn save_lesson_progress(&self, progress: &LessonProgress) -> PortResult<()>;

    async fn count_completed_lessons_in_course(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<i64>;

    async fn total_minutes_in_course(&self, student_id: Uuid, course_id: Uuid) -> PortResult<i64>;

    async fn count_quiz_attempts(&self, student_id: Uuid, quiz_id: Uuid) -> PortResult<i64>;

    async fn save_quiz_attempt(&self, attempt: &QuizAttempt) -> PortResult<()>;

    async fn save_quiz_answer(&self, answer: &QuizAnswer) -> PortResult<()>;
}

#[async_trait]
pub trait ConferenceRepository: Send + Sync {
    async fn create_room(&self, room: &ConferenceRoom) -> PortResult<()>;

    async fn get_room(&self, room_id: Uuid) -> PortResult<ConferenceRoom>;

    /// Persists the room's status and actual start/end times.
    async fn save_room(&self, room: &ConferenceRoom) -> PortResult<()>;

    /// Inserts a participant. Returns `false` if the user is already in the room.
    async fn insert_participant(&self, participant: &ConferenceParticipant) -> PortResult<bool>;

    async fn get_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ConferenceParticipant>>;

    async fn save_participant(&self, participant: &ConferenceParticipant) -> PortResult<()>;

    async fn list_participants(&self, room_id: Uuid) -> PortResult<Vec<ConferenceParticipant>>;

    async fn count_participants(&self, room_id: Uuid) -> PortResult<i64>;

    async fn create_recording(&self, recording: &ConferenceRecording) -> PortResult<()>;

    async fn list_recordings(&self, room_id: Uuid) -> PortResult<Vec<ConferenceRecording>>;

    async fn create_chat_message(&self, message: &ChatMessage) -> PortResult<()>;

    /// All messages in the room, oldest first.
    async fn list_chat_messages(&self, room_id: Uuid) -> PortResult<Vec<ChatMessage>>;
}

/// The full storage contract. Any type implementing every repository port is a
/// `DatabaseService`.
pub trait DatabaseService:
    UserRepository + CourseRepository + ProgressRepository + ConferenceRepository
{
}

impl<T> DatabaseService for T where
    T: UserRepository + CourseRepository + ProgressRepository + ConferenceRepository
{
}
