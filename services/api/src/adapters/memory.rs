//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the repository ports. It enforces the same
//! uniqueness constraints as the PostgreSQL schema and backs the test suite and
//! `DATABASE_URL=memory://` development runs. Nothing is persisted.

use async_trait::async_trait;
use chrono::Utc;
use lms_core::domain::{
    Answer, ChatMessage, ConferenceParticipant, ConferenceRecording, ConferenceRoom, Course,
    Enrollment, Lesson, LessonProgress, Module, NewCourse, NewLesson, NewQuiz, NewUser, Question,
    QuestionType, Quiz, QuizAnswer, QuizAttempt, User, UserCredentials,
};
use lms_core::ports::{
    ConferenceRepository, CourseRepository, PortError, PortResult, ProgressRepository,
    UserRepository,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserCredentials>,
    courses: HashMap<Uuid, Course>,
    modules: HashMap<Uuid, Module>,
    lessons: HashMap<Uuid, Lesson>,
    quizzes: HashMap<Uuid, Quiz>,
    questions: HashMap<Uuid, Question>,
    answers: HashMap<Uuid, Answer>,
    enrollments: Vec<Enrollment>,
    lesson_progress: Vec<LessonProgress>,
    quiz_attempts: Vec<QuizAttempt>,
    quiz_answers: Vec<QuizAnswer>,
    rooms: HashMap<Uuid, ConferenceRoom>,
    participants: Vec<ConferenceParticipant>,
    recordings: Vec<ConferenceRecording>,
    chat_messages: Vec<ChatMessage>,
}

impl Tables {
    fn course_of_lesson(&self, lesson_id: Uuid) -> Option<Uuid> {
        let lesson = self.lessons.get(&lesson_id)?;
        self.modules.get(&lesson.module_id).map(|m| m.course_id)
    }

    fn lessons_in_course(&self, course_id: Uuid) -> impl Iterator<Item = &Lesson> + '_ {
        self.lessons.values().filter(move |l| {
            self.modules
                .get(&l.module_id)
                .is_some_and(|m| m.course_id == course_id)
        })
    }

    fn student_progress_in_course(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> impl Iterator<Item = &LessonProgress> + '_ {
        self.lesson_progress.iter().filter(move |p| {
            p.student_id == student_id && self.course_of_lesson(p.lesson_id) == Some(course_id)
        })
    }
}

/// Keeps every table in memory behind a single lock.
#[derive(Default)]
pub struct InMemoryDb {
    tables: RwLock<Tables>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(kind: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind, id))
}

fn sorted_by_position<T: Clone>(items: Vec<&T>, key: impl Fn(&T) -> i32) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().cloned().collect();
    items.sort_by_key(|item| key(item));
    items
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for InMemoryDb {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|c| c.user.username == new_user.username) {
            return Err(PortError::Conflict("users_username_key".to_string()));
        }
        if tables.users.values().any(|c| c.user.email == new_user.email) {
            return Err(PortError::Conflict("users_email_key".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            role: new_user.role,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone_number: new_user.phone_number,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                hashed_password: new_user.hashed_password,
            },
        );
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        Ok(self.get_credentials(user_id).await?.user)
    }

    async fn get_credentials(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|c| c.user.username == username)
            .cloned()
            .ok_or_else(|| not_found("User", username))
    }

    async fn username_exists(&self, username: &str) -> PortResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|c| c.user.username == username))
    }

    async fn find_user_id_by_email(&self, email: &str) -> PortResult<Option<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|c| c.user.email == email)
            .map(|c| c.user.id))
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let creds = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        creds.hashed_password = hashed_password.to_string();
        creds.user.updated_at = Utc::now();
        Ok(())
    }

    async fn save_user(&self, user: &User) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|c| c.user.id != user.id && c.user.email == user.email)
        {
            return Err(PortError::Conflict("users_email_key".to_string()));
        }
        let creds = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| not_found("User", user.id))?;
        creds.user.email = user.email.clone();
        creds.user.first_name = user.first_name.clone();
        creds.user.last_name = user.last_name.clone();
        creds.user.phone_number = user.phone_number.clone();
        creds.user.updated_at = Utc::now();
        Ok(creds.user.clone())
    }
}

//=========================================================================================
// `CourseRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseRepository for InMemoryDb {
    async fn create_course(&self, new_course: NewCourse) -> PortResult<Course> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            instructor_id: new_course.instructor_id,
            title: new_course.title,
            description: new_course.description,
            category: new_course.category,
            price: new_course.price,
            duration_hours: new_course.duration_hours,
            difficulty_level: new_course.difficulty_level,
            is_published: false,
            created_at: now,
            updated_at: now,
        };
        tables.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let tables = self.tables.read().await;
        tables
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| not_found("Course", course_id))
    }

    async fn set_course_published(&self, course_id: Uuid, published: bool) -> PortResult<Course> {
        let mut tables = self.tables.write().await;
        let course = tables
            .courses
            .get_mut(&course_id)
            .ok_or_else(|| not_found("Course", course_id))?;
        course.is_published = published;
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let tables = self.tables.read().await;
        let mut courses: Vec<Course> = tables.courses.values().cloned().collect();
        courses.sort_by_key(|c| c.created_at);
        Ok(courses)
    }

    async fn list_courses_by_instructor(&self, instructor_id: Uuid) -> PortResult<Vec<Course>> {
        let mut courses = self.list_courses().await?;
        courses.retain(|c| c.instructor_id == instructor_id);
        Ok(courses)
    }

    async fn create_module(
        &self,
        course_id: Uuid,
        title: &str,
        description: &str,
        position: i32,
    ) -> PortResult<Module> {
        let mut tables = self.tables.write().await;
        if !tables.courses.contains_key(&course_id) {
            return Err(not_found("Course", course_id));
        }
        let module = Module {
            id: Uuid::new_v4(),
            course_id,
            title: title.to_string(),
            description: description.to_string(),
            position,
            created_at: Utc::now(),
        };
        tables.modules.insert(module.id, module.clone());
        Ok(module)
    }

    async fn get_module(&self, module_id: Uuid) -> PortResult<Module> {
        let tables = self.tables.read().await;
        tables
            .modules
            .get(&module_id)
            .cloned()
            .ok_or_else(|| not_found("Module", module_id))
    }

    async fn list_modules(&self, course_id: Uuid) -> PortResult<Vec<Module>> {
        let tables = self.tables.read().await;
        let modules: Vec<&Module> = tables
            .modules
            .values()
            .filter(|m| m.course_id == course_id)
            .collect();
        Ok(sorted_by_position(modules, |m| m.position))
    }

    async fn create_lesson(&self, new_lesson: NewLesson) -> PortResult<Lesson> {
        let mut tables = self.tables.write().await;
        if !tables.modules.contains_key(&new_lesson.module_id) {
            return Err(not_found("Module", new_lesson.module_id));
        }
        let lesson = Lesson {
            id: Uuid::new_v4(),
            module_id: new_lesson.module_id,
            title: new_lesson.title,
            content_type: new_lesson.content_type,
            video_url: new_lesson.video_url,
            text_content: new_lesson.text_content,
            duration_minutes: new_lesson.duration_minutes,
            position: new_lesson.position,
            is_preview: new_lesson.is_preview,
            created_at: Utc::now(),
        };
        tables.lessons.insert(lesson.id, lesson.clone());
        Ok(lesson)
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let tables = self.tables.read().await;
        tables
            .lessons
            .get(&lesson_id)
            .cloned()
            .ok_or_else(|| not_found("Lesson", lesson_id))
    }

    async fn list_lessons(&self, module_id: Uuid) -> PortResult<Vec<Lesson>> {
        let tables = self.tables.read().await;
        let lessons: Vec<&Lesson> = tables
            .lessons
            .values()
            .filter(|l| l.module_id == module_id)
            .collect();
        Ok(sorted_by_position(lessons, |l| l.position))
    }

    async fn course_id_for_lesson(&self, lesson_id: Uuid) -> PortResult<Uuid> {
        let tables = self.tables.read().await;
        tables
            .course_of_lesson(lesson_id)
            .ok_or_else(|| not_found("Lesson", lesson_id))
    }

    async fn count_lessons_in_course(&self, course_id: Uuid) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.lessons_in_course(course_id).count() as i64)
    }

    async fn create_quiz(&self, new_quiz: NewQuiz) -> PortResult<Quiz> {
        let mut tables = self.tables.write().await;
        if !tables.lessons.contains_key(&new_quiz.lesson_id) {
            return Err(not_found("Lesson", new_quiz.lesson_id));
        }
        let quiz = Quiz {
            id: Uuid::new_v4(),
            lesson_id: new_quiz.lesson_id,
            title: new_quiz.title,
            description: new_quiz.description,
            passing_score: new_quiz.passing_score,
            time_limit_minutes: new_quiz.time_limit_minutes,
            attempts_allowed: new_quiz.attempts_allowed,
            created_at: Utc::now(),
        };
        tables.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let tables = self.tables.read().await;
        tables
            .quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or_else(|| not_found("Quiz", quiz_id))
    }

    async fn create_question(
        &self,
        quiz_id: Uuid,
        question_text: &str,
        question_type: QuestionType,
        points: i32,
        position: i32,
    ) -> PortResult<Question> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.contains_key(&quiz_id) {
            return Err(not_found("Quiz", quiz_id));
        }
        let question = Question {
            id: Uuid::new_v4(),
            quiz_id,
            question_text: question_text.to_string(),
            question_type,
            points,
            position,
            created_at: Utc::now(),
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn create_answer(
        &self,
        question_id: Uuid,
        answer_text: &str,
        is_correct: bool,
        position: i32,
    ) -> PortResult<Answer> {
        let mut tables = self.tables.write().await;
        if !tables.questions.contains_key(&question_id) {
            return Err(not_found("Question", question_id));
        }
        let answer = Answer {
            id: Uuid::new_v4(),
            question_id,
            answer_text: answer_text.to_string(),
            is_correct,
            position,
        };
        tables.answers.insert(answer.id, answer.clone());
        Ok(answer)
    }

    async fn list_questions(&self, quiz_id: Uuid) -> PortResult<Vec<Question>> {
        let tables = self.tables.read().await;
        let questions: Vec<&Question> = tables
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .collect();
        Ok(sorted_by_position(questions, |q| q.position))
    }

    async fn list_answers(&self, question_id: Uuid) -> PortResult<Vec<Answer>> {
        let tables = self.tables.read().await;
        let answers: Vec<&Answer> = tables
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .collect();
        Ok(sorted_by_position(answers, |a| a.position))
    }

    async fn create_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let mut tables = self.tables.write().await;
        if tables
            .enrollments
            .iter()
            .any(|e| e.student_id == student_id && e.course_id == course_id)
        {
            return Ok(None);
        }
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id,
            course_id,
            enrolled_at: Utc::now(),
            completed_at: None,
            progress_percentage: 0.0,
        };
        tables.enrollments.push(enrollment.clone());
        Ok(Some(enrollment))
    }

    async fn get_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .find(|e| e.student_id == student_id && e.course_id == course_id)
            .cloned())
    }

    async fn list_enrollments_for_student(&self, student_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn count_enrollments(&self, course_id: Uuid) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .count() as i64)
    }

    async fn save_enrollment(&self, enrollment: &Enrollment) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .enrollments
            .iter_mut()
            .find(|e| e.id == enrollment.id)
            .ok_or_else(|| not_found("Enrollment", enrollment.id))?;
        stored.progress_percentage = enrollment.progress_percentage;
        stored.completed_at = enrollment.completed_at;
        Ok(())
    }
}

//=========================================================================================
// `ProgressRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressRepository for InMemoryDb {
    async fn get_or_create_lesson_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> PortResult<LessonProgress> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .lesson_progress
            .iter()
            .find(|p| p.student_id == student_id && p.lesson_id == lesson_id)
        {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let progress = LessonProgress {
            id: Uuid::new_v4(),
            student_id,
            lesson_id,
            is_completed: false,
            time_spent_minutes: 0,
            completion_percentage: 0.0,
            started_at: now,
            completed_at: None,
            last_accessed: now,
        };
        tables.lesson_progress.push(progress.clone());
        Ok(progress)
    }

    async fn get_lesson_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> PortResult<Option<LessonProgress>> {
        let tables = self.tables.read().await;
        Ok(tables
            .lesson_progress
            .iter()
            .find(|p| p.student_id == student_id && p.lesson_id == lesson_id)
            .cloned())
    }

    async fn save_lesson_progress(&self, progress: &LessonProgress) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .lesson_progress
            .iter_mut()
            .find(|p| p.id == progress.id)
            .ok_or_else(|| not_found("Lesson progress", progress.id))?;
        *stored = progress.clone();
        Ok(())
    }

    async fn count_completed_lessons_in_course(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .student_progress_in_course(student_id, course_id)
            .filter(|p| p.is_completed)
            .count() as i64)
    }

    async fn total_minutes_in_course(&self, student_id: Uuid, course_id: Uuid) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .student_progress_in_course(student_id, course_id)
            .map(|p| i64::from(p.time_spent_minutes))
            .sum())
    }

    async fn count_quiz_attempts(&self, student_id: Uuid, quiz_id: Uuid) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .quiz_attempts
            .iter()
            .filter(|a| a.student_id == student_id && a.quiz_id == quiz_id)
            .count() as i64)
    }

    async fn save_quiz_attempt(&self, attempt: &QuizAttempt) -> PortResult<()> {
        self.tables.write().await.quiz_attempts.push(attempt.clone());
        Ok(())
    }

    async fn save_quiz_answer(&self, answer: &QuizAnswer) -> PortResult<()> {
        self.tables.write().await.quiz_answers.push(answer.clone());
        Ok(())
    }
}

//=========================================================================================
// `ConferenceRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConferenceRepository for InMemoryDb {
    async fn create_room(&self, room: &ConferenceRoom) -> PortResult<()> {
        self.tables.write().await.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn get_room(&self, room_id: Uuid) -> PortResult<ConferenceRoom> {
        let tables = self.tables.read().await;
        tables
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or_else(|| not_found("Room", room_id))
    }

    async fn save_room(&self, room: &ConferenceRoom) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .rooms
            .get_mut(&room.id)
            .ok_or_else(|| not_found("Room", room.id))?;
        stored.status = room.status;
        stored.actual_start = room.actual_start;
        stored.actual_end = room.actual_end;
        stored.recording_url = room.recording_url.clone();
        Ok(())
    }

    async fn insert_participant(&self, participant: &ConferenceParticipant) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.participants.iter().any(|p| {
            p.conference_id == participant.conference_id && p.user_id == participant.user_id
        }) {
            return Ok(false);
        }
        tables.participants.push(participant.clone());
        Ok(true)
    }

    async fn get_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ConferenceParticipant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .find(|p| p.conference_id == room_id && p.user_id == user_id)
            .cloned())
    }

    async fn save_participant(&self, participant: &ConferenceParticipant) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
            .ok_or_else(|| not_found("Participant", participant.id))?;
        *stored = participant.clone();
        Ok(())
    }

    async fn list_participants(&self, room_id: Uuid) -> PortResult<Vec<ConferenceParticipant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.conference_id == room_id)
            .cloned()
            .collect())
    }

    async fn count_participants(&self, room_id: Uuid) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.conference_id == room_id)
            .count() as i64)
    }

    async fn create_recording(&self, recording: &ConferenceRecording) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .recordings
            .iter()
            .any(|r| r.recording_id == recording.recording_id)
        {
            return Err(PortError::Conflict(
                "conference_recordings_recording_id_key".to_string(),
            ));
        }
        tables.recordings.push(recording.clone());
        Ok(())
    }

    async fn list_recordings(&self, room_id: Uuid) -> PortResult<Vec<ConferenceRecording>> {
        let tables = self.tables.read().await;
        Ok(tables
            .recordings
            .iter()
            .filter(|r| r.conference_id == room_id)
            .cloned()
            .collect())
    }

    async fn create_chat_message(&self, message: &ChatMessage) -> PortResult<()> {
        self.tables.write().await.chat_messages.push(message.clone());
        Ok(())
    }

    async fn list_chat_messages(&self, room_id: Uuid) -> PortResult<Vec<ChatMessage>> {
        let tables = self.tables.read().await;
        Ok(tables
            .chat_messages
            .iter()
            .filter(|m| m.conference_id == room_id)
            .cloned()
            .collect())
    }
}
