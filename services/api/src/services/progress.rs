//! services/api/src/services/progress.rs
//!
//! Per-lesson progress, quiz attempts, and the aggregated course percentage.

use chrono::{DateTime, Utc};
use lms_core::{
    domain::{QuizAnswer, QuizAttempt},
    ports::{DatabaseService, PortError},
    rules::{course_completion_percentage, is_answer_correct, quiz_score_percentage},
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{not_found, ServiceError, ServiceResult};

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonStarted {
    pub progress_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonProgressView {
    pub lesson_id: Uuid,
    pub completion_percentage: f64,
    pub time_spent_minutes: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// The course percentage after recomputation, if the student is enrolled.
    pub course_progress_percentage: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseProgressView {
    pub course_id: Uuid,
    pub progress_percentage: f64,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub time_spent_minutes: i64,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResult {
    pub attempt_id: Uuid,
    pub attempt_number: i32,
    pub score: f64,
    pub points_earned: i64,
    pub total_points: i64,
    pub is_passed: bool,
}

/// One submitted answer of a quiz attempt.
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_answer: String,
}

#[derive(Clone)]
pub struct ProgressService {
    db: Arc<dyn DatabaseService>,
}

impl ProgressService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn start_lesson(&self, student_id: Uuid, lesson_id: Uuid) -> ServiceResult<LessonStarted> {
        let missing = || ServiceError::NotFound("Student or lesson not found".to_string());
        self.db.get_user(student_id).await.map_err(|e| match e {
            PortError::NotFound(_) => missing(),
            other => ServiceError::Port(other),
        })?;
        self.db.get_lesson(lesson_id).await.map_err(|e| match e {
            PortError::NotFound(_) => missing(),
            other => ServiceError::Port(other),
        })?;

        let progress = self
            .db
            .get_or_create_lesson_progress(student_id, lesson_id)
            .await?;
        debug!("Tracking lesson {} for student {}", lesson_id, student_id);
        Ok(LessonStarted {
            progress_id: progress.id,
        })
    }

    /// Stores the new percentage and adds `time_spent` minutes. Reaching 100% marks
    /// the lesson completed; the completion time is recorded once and kept. The
    /// course percentage is recomputed afterwards as a separate write.
    pub async fn update_lesson_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
        completion_percentage: f64,
        time_spent: i32,
    ) -> ServiceResult<LessonProgressView> {
        if !(0.0..=100.0).contains(&completion_percentage) {
            return Err(ServiceError::Invalid(
                "Completion percentage must be between 0 and 100".to_string(),
            ));
        }
        if time_spent < 0 {
            return Err(ServiceError::Invalid(
                "Time spent must not be negative".to_string(),
            ));
        }

        let mut progress = self
            .db
            .get_lesson_progress(student_id, lesson_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Progress record not found".to_string()))?;

        let now = Utc::now();
        progress.completion_percentage = completion_percentage;
        progress.time_spent_minutes = progress.time_spent_minutes.saturating_add(time_spent);
        progress.last_accessed = now;
        if completion_percentage >= 100.0 && !progress.is_completed {
            progress.is_completed = true;
            progress.completed_at = Some(now);
            info!("Student {} completed lesson {}", student_id, lesson_id);
        }
        self.db.save_lesson_progress(&progress).await?;

        let course_id = self.db.course_id_for_lesson(lesson_id).await?;
        let course_progress_percentage = self.update_course_progress(student_id, course_id).await?;

        Ok(LessonProgressView {
            lesson_id,
            completion_percentage: progress.completion_percentage,
            time_spent_minutes: progress.time_spent_minutes,
            is_completed: progress.is_completed,
            completed_at: progress.completed_at,
            course_progress_percentage,
        })
    }

    /// Recomputes the enrollment's percentage as completed lessons over total
    /// lessons. Returns `None` when the student is not enrolled.
    pub async fn update_course_progress(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<Option<f64>> {
        let Some(mut enrollment) = self.db.get_enrollment(student_id, course_id).await? else {
            debug!(
                "Student {} is not enrolled in {}, skipping course progress",
                student_id, course_id
            );
            return Ok(None);
        };

        let total = self.db.count_lessons_in_course(course_id).await?;
        let completed = self
            .db
            .count_completed_lessons_in_course(student_id, course_id)
            .await?;
        enrollment.progress_percentage = course_completion_percentage(completed, total);
        if enrollment.progress_percentage >= 100.0 && enrollment.completed_at.is_none() {
            enrollment.completed_at = Some(Utc::now());
            info!("Student {} completed course {}", student_id, course_id);
        }
        self.db.save_enrollment(&enrollment).await?;
        Ok(Some(enrollment.progress_percentage))
    }

    pub async fn get_course_progress(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<CourseProgressView> {
        let enrollment = self
            .db
            .get_enrollment(student_id, course_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Not enrolled in this course".to_string()))?;

        Ok(CourseProgressView {
            course_id,
            progress_percentage: enrollment.progress_percentage,
            completed_lessons: self
                .db
                .count_completed_lessons_in_course(student_id, course_id)
                .await?,
            total_lessons: self.db.count_lessons_in_course(course_id).await?,
            time_spent_minutes: self.db.total_minutes_in_course(student_id, course_id).await?,
            completed_at: enrollment.completed_at,
        })
    }

    /// Grades an attempt against the quiz's stored answers and records it.
    pub async fn submit_quiz(
        &self,
        student_id: Uuid,
        quiz_id: Uuid,
        answers: Vec<SubmittedAnswer>,
        time_taken_minutes: i32,
    ) -> ServiceResult<QuizResult> {
        let quiz = self
            .db
            .get_quiz(quiz_id)
            .await
            .map_err(not_found("Quiz not found"))?;

        let previous = self.db.count_quiz_attempts(student_id, quiz_id).await?;
        if previous >= i64::from(quiz.attempts_allowed) {
            return Err(ServiceError::Conflict("Maximum attempts reached".to_string()));
        }

        let questions = self.db.list_questions(quiz_id).await?;
        let submitted: HashMap<Uuid, &str> = answers
            .iter()
            .map(|a| (a.question_id, a.selected_answer.as_str()))
            .collect();

        let started_at = Utc::now();
        let attempt_id = Uuid::new_v4();
        let mut total_points: i64 = 0;
        let mut points_earned: i64 = 0;
        let mut graded = Vec::new();
        for question in &questions {
            total_points += i64::from(question.points);
            let Some(selected) = submitted.get(&question.id) else {
                continue;
            };
            let stored_answers = self.db.list_answers(question.id).await?;
            let is_correct = is_answer_correct(question.question_type, &stored_answers, selected);
            let earned = if is_correct { question.points } else { 0 };
            points_earned += i64::from(earned);
            graded.push(QuizAnswer {
                id: Uuid::new_v4(),
                attempt_id,
                question_id: question.id,
                selected_answer: selected.to_string(),
                is_correct,
                points_earned: earned,
            });
        }

        let score = quiz_score_percentage(points_earned, total_points);
        let attempt = QuizAttempt {
            id: attempt_id,
            student_id,
            quiz_id,
            score,
            total_points,
            is_passed: score >= f64::from(quiz.passing_score),
            time_taken_minutes: time_taken_minutes.max(0),
            attempt_number: previous as i32 + 1,
            started_at,
            completed_at: Some(Utc::now()),
        };
        self.db.save_quiz_attempt(&attempt).await?;
        for answer in &graded {
            self.db.save_quiz_answer(answer).await?;
        }

        info!(
            "Student {} scored {} on quiz {} (attempt {})",
            student_id, score, quiz_id, attempt.attempt_number
        );
        Ok(QuizResult {
            attempt_id,
            attempt_number: attempt.attempt_number,
            score,
            points_earned,
            total_points,
            is_passed: attempt.is_passed,
        })
    }
}
