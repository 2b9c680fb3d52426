mod common;

use api_lib::error::ServiceError;
use api_lib::services::courses::{AnswerDraft, QuestionDraft, QuizDraft};
use api_lib::services::progress::SubmittedAnswer;
use api_lib::services::AuthUser;
use api_lib::web::AppState;
use lms_core::domain::Role;
use lms_core::ports::{CourseRepository, ProgressRepository};
use uuid::Uuid;

/// A published course with two lessons and an enrolled student.
struct Fixture {
    owner: AuthUser,
    student: AuthUser,
    course_id: Uuid,
    lessons: [Uuid; 2],
}

async fn fixture(state: &AppState) -> Fixture {
    let owner = common::seed_user(state, "tina", Role::Instructor).await;
    let student = common::seed_user(state, "sam", Role::Student).await;
    let (course_id, module_id) = common::course_with_module(state, &owner, true).await;
    let mut lessons = [Uuid::nil(); 2];
    for (idx, slot) in lessons.iter_mut().enumerate() {
        *slot = state
            .courses
            .add_lesson(
                &owner,
                module_id,
                common::text_lesson(&format!("Lesson {}", idx + 1), idx as i32 + 1, false),
            )
            .await
            .unwrap()
            .lesson_id;
    }
    state
        .courses
        .enroll_student(student.id, course_id)
        .await
        .unwrap();
    Fixture {
        owner,
        student,
        course_id,
        lessons,
    }
}

#[tokio::test]
async fn starting_a_lesson_is_idempotent() {
    let state = common::app();
    let f = fixture(&state).await;

    let first = state
        .progress
        .start_lesson(f.student.id, f.lessons[0])
        .await
        .unwrap();
    let second = state
        .progress
        .start_lesson(f.student.id, f.lessons[0])
        .await
        .unwrap();
    assert_eq!(first.progress_id, second.progress_id);

    let err = state
        .progress
        .start_lesson(f.student.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Student or lesson not found");
}

#[tokio::test]
async fn progress_requires_a_started_lesson_and_a_valid_percentage() {
    let state = common::app();
    let f = fixture(&state).await;

    let err = state
        .progress
        .update_lesson_progress(f.student.id, f.lessons[0], 50.0, 5)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Progress record not found");

    state
        .progress
        .start_lesson(f.student.id, f.lessons[0])
        .await
        .unwrap();
    let err = state
        .progress
        .update_lesson_progress(f.student.id, f.lessons[0], 120.0, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));
}

#[tokio::test]
async fn completion_timestamp_is_set_once() {
    let state = common::app();
    let f = fixture(&state).await;
    state
        .progress
        .start_lesson(f.student.id, f.lessons[0])
        .await
        .unwrap();

    let first = state
        .progress
        .update_lesson_progress(f.student.id, f.lessons[0], 100.0, 10)
        .await
        .unwrap();
    assert!(first.is_completed);
    let completed_at = first.completed_at.expect("completion recorded");

    let again = state
        .progress
        .update_lesson_progress(f.student.id, f.lessons[0], 100.0, 5)
        .await
        .unwrap();
    assert_eq!(again.completed_at, Some(completed_at));
    assert_eq!(again.time_spent_minutes, 15);

    let stored = state
        .db
        .get_lesson_progress(f.student.id, f.lessons[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.completed_at, Some(completed_at));
}

#[tokio::test]
async fn course_progress_is_the_completed_lesson_ratio() {
    let state = common::app();
    let f = fixture(&state).await;
    for lesson in f.lessons {
        state.progress.start_lesson(f.student.id, lesson).await.unwrap();
    }

    let half = state
        .progress
        .update_lesson_progress(f.student.id, f.lessons[0], 100.0, 10)
        .await
        .unwrap();
    assert_eq!(half.course_progress_percentage, Some(50.0));

    // Partial progress on the second lesson does not count as completed.
    state
        .progress
        .update_lesson_progress(f.student.id, f.lessons[1], 60.0, 4)
        .await
        .unwrap();
    let view = state
        .progress
        .get_course_progress(f.student.id, f.course_id)
        .await
        .unwrap();
    assert_eq!(view.progress_percentage, 50.0);
    assert_eq!(view.completed_lessons, 1);
    assert_eq!(view.total_lessons, 2);
    assert_eq!(view.time_spent_minutes, 14);
    assert!(view.completed_at.is_none());

    state
        .progress
        .update_lesson_progress(f.student.id, f.lessons[1], 100.0, 1)
        .await
        .unwrap();
    let done = state
        .db
        .get_enrollment(f.student.id, f.course_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.progress_percentage, 100.0);
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn progress_without_enrollment_is_kept_per_lesson() {
    let state = common::app();
    let f = fixture(&state).await;
    let outsider = common::seed_user(&state, "olga", Role::Student).await;
    state.progress.start_lesson(outsider.id, f.lessons[0]).await.unwrap();

    let view = state
        .progress
        .update_lesson_progress(outsider.id, f.lessons[0], 100.0, 3)
        .await
        .unwrap();
    assert!(view.is_completed);
    assert_eq!(view.course_progress_percentage, None);

    let err = state
        .progress
        .get_course_progress(outsider.id, f.course_id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not enrolled in this course");
}

#[tokio::test]
async fn quiz_attempts_are_scored_and_capped() {
    let state = common::app();
    let f = fixture(&state).await;
    let quiz_id = state
        .courses
        .create_quiz(
            &f.owner,
            f.lessons[0],
            QuizDraft {
                title: "Check".to_string(),
                passing_score: Some(60),
                attempts_allowed: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .quiz_id;

    let question = |text: &str, kind: &str, points: i32, order: i32, correct: &str| {
        QuestionDraft {
            question_text: text.to_string(),
            question_type: kind.to_string(),
            points: Some(points),
            order,
            answers: vec![AnswerDraft {
                text: correct.to_string(),
                is_correct: true,
            }],
        }
    };
    let q1 = state
        .courses
        .add_question(&f.owner, quiz_id, question("Borrowing?", "true_false", 3, 1, "true"))
        .await
        .unwrap()
        .question_id;
    let q2 = state
        .courses
        .add_question(&f.owner, quiz_id, question("Keyword?", "short_answer", 1, 2, "mut"))
        .await
        .unwrap()
        .question_id;

    let answer = |question_id: Uuid, text: &str| SubmittedAnswer {
        question_id,
        selected_answer: text.to_string(),
    };

    let first = state
        .progress
        .submit_quiz(f.student.id, quiz_id, vec![answer(q1, " TRUE "), answer(q2, "let")], 5)
        .await
        .unwrap();
    assert_eq!(first.attempt_number, 1);
    assert_eq!(first.points_earned, 3);
    assert_eq!(first.total_points, 4);
    assert_eq!(first.score, 75.0);
    assert!(first.is_passed);

    let second = state
        .progress
        .submit_quiz(f.student.id, quiz_id, vec![answer(q2, "let")], 2)
        .await
        .unwrap();
    assert_eq!(second.attempt_number, 2);
    assert_eq!(second.score, 0.0);
    assert!(!second.is_passed);

    let err = state
        .progress
        .submit_quiz(f.student.id, quiz_id, vec![answer(q1, "true")], 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(err.to_string(), "Maximum attempts reached");
    assert_eq!(
        state.db.count_quiz_attempts(f.student.id, quiz_id).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn essays_are_not_auto_graded() {
    let state = common::app();
    let f = fixture(&state).await;
    let quiz_id = state
        .courses
        .create_quiz(
            &f.owner,
            f.lessons[1],
            QuizDraft {
                title: "Reflection".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .quiz_id;
    let essay = state
        .courses
        .add_question(
            &f.owner,
            quiz_id,
            QuestionDraft {
                question_text: "Describe lifetimes".to_string(),
                question_type: "essay".to_string(),
                points: Some(5),
                order: 1,
                answers: vec![AnswerDraft {
                    text: "anything".to_string(),
                    is_correct: true,
                }],
            },
        )
        .await
        .unwrap()
        .question_id;

    let result = state
        .progress
        .submit_quiz(
            f.student.id,
            quiz_id,
            vec![SubmittedAnswer {
                question_id: essay,
                selected_answer: "anything".to_string(),
            }],
            10,
        )
        .await
        .unwrap();
    assert_eq!(result.points_earned, 0);
    assert_eq!(result.total_points, 5);

    let err = state
        .progress
        .submit_quiz(f.student.id, Uuid::new_v4(), Vec::new(), 0)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Quiz not found");
}

#[tokio::test]
async fn large_point_totals_do_not_overflow() {
    let state = common::app();
    let f = fixture(&state).await;
    let quiz_id = state
        .courses
        .create_quiz(
            &f.owner,
            f.lessons[0],
            QuizDraft {
                title: "Heavy".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .quiz_id;
    let mut answers = Vec::new();
    for order in 1..=2 {
        let question_id = state
            .courses
            .add_question(
                &f.owner,
                quiz_id,
                QuestionDraft {
                    question_text: format!("Essay {}", order),
                    question_type: "essay".to_string(),
                    points: Some(2_000_000_000),
                    order,
                    answers: Vec::new(),
                },
            )
            .await
            .unwrap()
            .question_id;
        answers.push(SubmittedAnswer {
            question_id,
            selected_answer: "long answer".to_string(),
        });
    }

    let result = state
        .progress
        .submit_quiz(f.student.id, quiz_id, answers, 30)
        .await
        .unwrap();
    assert_eq!(result.total_points, 4_000_000_000);
    assert_eq!(result.points_earned, 0);
    assert_eq!(result.score, 0.0);
    assert!(!result.is_passed);
}
