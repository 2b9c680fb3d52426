//! crates/lms_core/src/rules.rs
//!
//! Pure bookkeeping arithmetic shared by the progress and conferencing services.

use crate::domain::{Answer, QuestionType};
use chrono::{DateTime, Utc};

/// Rounds to two decimal places, the precision percentages are stored with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of completed lessons in a course, as a percentage.
///
/// A course without lessons reports 0.
pub fn course_completion_percentage(completed_lessons: i64, total_lessons: i64) -> f64 {
    if total_lessons <= 0 {
        return 0.0;
    }
    let completed = completed_lessons.clamp(0, total_lessons);
    round2(completed as f64 / total_lessons as f64 * 100.0)
}

/// Share of the quiz's points earned, as a percentage in `0..=100`.
pub fn quiz_score_percentage(points_earned: i64, total_points: i64) -> f64 {
    if total_points <= 0 {
        return 0.0;
    }
    let earned = points_earned.clamp(0, total_points);
    round2(earned as f64 / total_points as f64 * 100.0)
}

/// Grades a submitted answer against the question's stored answers.
///
/// Essays are never auto-graded.
pub fn is_answer_correct(question_type: QuestionType, answers: &[Answer], selected: &str) -> bool {
    if question_type == QuestionType::Essay {
        return false;
    }
    let selected = selected.trim();
    answers
        .iter()
        .filter(|a| a.is_correct)
        .any(|a| a.answer_text.trim().eq_ignore_ascii_case(selected))
}

/// Whole minutes between two instants, rounded down. Never negative.
pub fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i32 {
    let minutes = (to - from).num_minutes().max(0);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn answer(text: &str, is_correct: bool) -> Answer {
        Answer {
            id: Uuid::new_v4(),
            question_id: Uuid::new_v4(),
            answer_text: text.to_string(),
            is_correct,
            position: 1,
        }
    }

    #[test]
    fn course_percentage_is_ratio_of_completed_lessons() {
        assert_eq!(course_completion_percentage(0, 0), 0.0);
        assert_eq!(course_completion_percentage(1, 4), 25.0);
        assert_eq!(course_completion_percentage(1, 3), 33.33);
        assert_eq!(course_completion_percentage(3, 3), 100.0);
        assert_eq!(course_completion_percentage(5, 3), 100.0);
    }

    #[test]
    fn quiz_score_rounds_to_two_places() {
        assert_eq!(quiz_score_percentage(2, 3), 66.67);
        assert_eq!(quiz_score_percentage(0, 0), 0.0);
        assert_eq!(quiz_score_percentage(4_000_000_000, 4_000_000_000), 100.0);
    }

    #[test]
    fn grading_ignores_case_and_whitespace() {
        let answers = vec![answer("Paris", true), answer("Lyon", false)];
        assert!(is_answer_correct(QuestionType::MultipleChoice, &answers, "  paris "));
        assert!(!is_answer_correct(QuestionType::MultipleChoice, &answers, "Lyon"));
        assert!(!is_answer_correct(QuestionType::Essay, &answers, "Paris"));
    }

    #[test]
    fn elapsed_minutes_floors_partial_minutes() {
        let start = Utc::now();
        assert_eq!(elapsed_minutes(start, start + Duration::seconds(119)), 1);
        assert_eq!(elapsed_minutes(start, start + Duration::minutes(45)), 45);
        assert_eq!(elapsed_minutes(start, start - Duration::minutes(5)), 0);
    }
}
