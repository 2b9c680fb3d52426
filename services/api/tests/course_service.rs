mod common;

use api_lib::error::ServiceError;
use api_lib::services::courses::{AnswerDraft, QuestionDraft, QuizDraft};
use lms_core::domain::Role;
use lms_core::ports::CourseRepository;

#[tokio::test]
async fn only_instructors_and_admins_create_courses() {
    let state = common::app();
    let student = common::seed_user(&state, "sam", Role::Student).await;
    let admin = common::seed_user(&state, "root", Role::Admin).await;

    let err = state
        .courses
        .create_course(student.id, common::draft("Rust 101"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Instructor not found");

    let created = state
        .courses
        .create_course(admin.id, common::draft("Rust 101"))
        .await
        .unwrap();
    let course = state.db.get_course(created.course_id).await.unwrap();
    assert!(!course.is_published);
    assert_eq!(course.price, 0.0);
    assert_eq!(course.difficulty_level.as_str(), "beginner");
}

#[tokio::test]
async fn unknown_difficulty_is_rejected() {
    let state = common::app();
    let instructor = common::seed_user(&state, "tina", Role::Instructor).await;
    let mut draft = common::draft("Rust 101");
    draft.difficulty_level = Some("impossible".to_string());

    let err = state
        .courses
        .create_course(instructor.id, draft)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid difficulty level");
}

#[tokio::test]
async fn authoring_is_limited_to_the_owner_and_admins() {
    let state = common::app();
    let owner = common::seed_user(&state, "tina", Role::Instructor).await;
    let rival = common::seed_user(&state, "rex", Role::Instructor).await;
    let admin = common::seed_user(&state, "root", Role::Admin).await;
    let (course_id, _) = common::course_with_module(&state, &owner, false).await;

    let err = state
        .courses
        .add_module(&rival, course_id, "Hijack", "", 2)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(err.to_string(), "Permission denied");

    state
        .courses
        .add_module(&admin, course_id, "Appendix", "", 2)
        .await
        .unwrap();
    assert_eq!(state.db.list_modules(course_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_parents_are_reported() {
    let state = common::app();
    let owner = common::seed_user(&state, "tina", Role::Instructor).await;

    let err = state
        .courses
        .add_module(&owner, uuid::Uuid::new_v4(), "Orphan", "", 1)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Course not found");

    let err = state
        .courses
        .add_lesson(&owner, uuid::Uuid::new_v4(), common::text_lesson("Orphan", 1, false))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Module not found");

    let err = state
        .courses
        .create_quiz(&owner, uuid::Uuid::new_v4(), QuizDraft::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Lesson not found");
}

#[tokio::test]
async fn quiz_defaults_and_answer_order() {
    let state = common::app();
    let owner = common::seed_user(&state, "tina", Role::Instructor).await;
    let (_, module_id) = common::course_with_module(&state, &owner, false).await;
    let lesson_id = state
        .courses
        .add_lesson(&owner, module_id, common::text_lesson("Ownership", 1, false))
        .await
        .unwrap()
        .lesson_id;

    let quiz_id = state
        .courses
        .create_quiz(
            &owner,
            lesson_id,
            QuizDraft {
                title: "Check".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .quiz_id;
    let quiz = state.db.get_quiz(quiz_id).await.unwrap();
    assert_eq!(quiz.passing_score, 70);
    assert_eq!(quiz.time_limit_minutes, 30);
    assert_eq!(quiz.attempts_allowed, 3);

    let question_id = state
        .courses
        .add_question(
            &owner,
            quiz_id,
            QuestionDraft {
                question_text: "Who owns a moved value?".to_string(),
                question_type: "multiple_choice".to_string(),
                points: Some(2),
                order: 1,
                answers: vec![
                    AnswerDraft {
                        text: "The caller".to_string(),
                        is_correct: false,
                    },
                    AnswerDraft {
                        text: "The callee".to_string(),
                        is_correct: true,
                    },
                ],
            },
        )
        .await
        .unwrap()
        .question_id;

    let answers = state.db.list_answers(question_id).await.unwrap();
    let order: Vec<(i32, &str)> = answers
        .iter()
        .map(|a| (a.position, a.answer_text.as_str()))
        .collect();
    assert_eq!(order, vec![(1, "The caller"), (2, "The callee")]);
}

#[tokio::test]
async fn enrollment_needs_a_published_course_and_happens_once() {
    let state = common::app();
    let owner = common::seed_user(&state, "tina", Role::Instructor).await;
    let student = common::seed_user(&state, "sam", Role::Student).await;
    let (course_id, _) = common::course_with_module(&state, &owner, false).await;

    let err = state
        .courses
        .enroll_student(student.id, course_id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Course not found or not published");

    state
        .courses
        .publish_course(&owner, course_id, true)
        .await
        .unwrap();
    state
        .courses
        .enroll_student(student.id, course_id)
        .await
        .unwrap();

    let err = state
        .courses
        .enroll_student(student.id, course_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(err.to_string(), "Student already enrolled");

    let err = state
        .courses
        .enroll_student(owner.id, course_id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Student not found");
}

#[tokio::test]
async fn lesson_bodies_are_gated_by_access() {
    let state = common::app();
    let owner = common::seed_user(&state, "tina", Role::Instructor).await;
    let student = common::seed_user(&state, "sam", Role::Student).await;
    let (course_id, module_id) = common::course_with_module(&state, &owner, true).await;
    state
        .courses
        .add_lesson(&owner, module_id, common::text_lesson("Locked", 2, false))
        .await
        .unwrap();
    state
        .courses
        .add_lesson(&owner, module_id, common::text_lesson("Preview", 1, true))
        .await
        .unwrap();

    let content = state
        .courses
        .get_course_content(course_id, Some(&student))
        .await
        .unwrap();
    assert_eq!(content.course.instructor, "tina");
    let lessons = &content.course.modules[0].lessons;
    assert_eq!(lessons[0].title, "Preview");
    assert_eq!(lessons[0].text_content.as_deref(), Some("Body of Preview"));
    assert_eq!(lessons[1].title, "Locked");
    assert!(lessons[1].text_content.is_none());
    assert!(!lessons[1].content_available);

    let anonymous = state
        .courses
        .get_course_content(course_id, None)
        .await
        .unwrap();
    assert!(anonymous.course.modules[0]
        .lessons
        .iter()
        .all(|l| l.text_content.is_none()));

    state
        .courses
        .enroll_student(student.id, course_id)
        .await
        .unwrap();
    let enrolled = state
        .courses
        .get_course_content(course_id, Some(&student))
        .await
        .unwrap();
    assert!(enrolled.course.modules[0]
        .lessons
        .iter()
        .all(|l| l.text_content.is_some()));

    let own = state
        .courses
        .get_course_content(course_id, Some(&owner))
        .await
        .unwrap();
    assert!(own.course.modules[0].lessons.iter().all(|l| l.content_available));
}

#[tokio::test]
async fn course_lists_depend_on_the_role() {
    let state = common::app();
    let owner = common::seed_user(&state, "tina", Role::Instructor).await;
    let student = common::seed_user(&state, "sam", Role::Student).await;
    let admin = common::seed_user(&state, "root", Role::Admin).await;
    let (course_id, _) = common::course_with_module(&state, &owner, true).await;
    state
        .courses
        .enroll_student(student.id, course_id)
        .await
        .unwrap();

    let taught = state
        .courses
        .get_user_courses(owner.id, Role::Instructor)
        .await
        .unwrap();
    assert_eq!(taught.courses.len(), 1);
    assert_eq!(taught.courses[0].enrollments_count, Some(1));
    assert_eq!(taught.courses[0].is_published, Some(true));
    assert_eq!(taught.courses[0].created_at.as_ref().map(|d| d.len()), Some(10));

    let taken = state
        .courses
        .get_user_courses(student.id, Role::Student)
        .await
        .unwrap();
    assert_eq!(taken.courses[0].instructor.as_deref(), Some("tina"));
    assert_eq!(taken.courses[0].progress_percentage, Some(0.0));

    let all = state
        .courses
        .get_user_courses(admin.id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(all.courses.len(), 1);
    assert_eq!(all.courses[0].enrollments_count, Some(1));
}

#[tokio::test]
async fn questions_must_be_worth_at_least_one_point() {
    let state = common::app();
    let owner = common::seed_user(&state, "tina", Role::Instructor).await;
    let (_, module_id) = common::course_with_module(&state, &owner, false).await;
    let lesson_id = state
        .courses
        .add_lesson(&owner, module_id, common::text_lesson("Traits", 1, false))
        .await
        .unwrap()
        .lesson_id;
    let quiz_id = state
        .courses
        .create_quiz(&owner, lesson_id, QuizDraft::default())
        .await
        .unwrap()
        .quiz_id;

    for points in [0, -1] {
        let err = state
            .courses
            .add_question(
                &owner,
                quiz_id,
                QuestionDraft {
                    question_text: "Is Send auto?".to_string(),
                    question_type: "true_false".to_string(),
                    points: Some(points),
                    order: 1,
                    answers: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
        assert_eq!(err.to_string(), "Points must be positive");
    }
    assert!(state.db.list_questions(quiz_id).await.unwrap().is_empty());
}
