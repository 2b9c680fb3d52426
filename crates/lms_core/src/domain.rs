//! crates/lms_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Enumerations
//=========================================================================================

/// Returned when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum with a fixed
/// snake_case text form.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    Instructor,
    #[default]
    Student,
}
text_enum!(Role, "role", {
    Admin => "admin",
    Instructor => "instructor",
    Student => "student",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}
text_enum!(DifficultyLevel, "difficulty level", {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Video,
    Text,
    Document,
    Interactive,
}
text_enum!(ContentType, "content type", {
    Video => "video",
    Text => "text",
    Document => "document",
    Interactive => "interactive",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}
text_enum!(QuestionType, "question type", {
    MultipleChoice => "multiple_choice",
    TrueFalse => "true_false",
    ShortAnswer => "short_answer",
    Essay => "essay",
});

/// Lifecycle of a conference room. Transitions only move forward:
/// `Scheduled -> Active -> Ended`, or `Scheduled -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConferenceStatus {
    #[default]
    Scheduled,
    Active,
    Ended,
    Cancelled,
}
text_enum!(ConferenceStatus, "conference status", {
    Scheduled => "scheduled",
    Active => "active",
    Ended => "ended",
    Cancelled => "cancelled",
});

impl ConferenceStatus {
    pub fn can_start(&self) -> bool {
        matches!(self, ConferenceStatus::Scheduled)
    }

    pub fn can_end(&self) -> bool {
        matches!(self, ConferenceStatus::Active)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, ConferenceStatus::Scheduled)
    }

    /// Ended and cancelled rooms accept no further activity.
    pub fn is_closed(&self) -> bool {
        matches!(self, ConferenceStatus::Ended | ConferenceStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticipantRole {
    Host,
    Presenter,
    #[default]
    Participant,
}
text_enum!(ParticipantRole, "participant role", {
    Host => "host",
    Presenter => "presenter",
    Participant => "participant",
});

//=========================================================================================
// Auth
//=========================================================================================

/// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

/// Profile fields a user may change. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(phone_number) = &self.phone_number {
            user.phone_number = Some(phone_number.clone());
        }
    }
}

//=========================================================================================
// Course Management
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub duration_hours: i32,
    pub difficulty_level: DifficultyLevel,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub duration_hours: i32,
    pub difficulty_level: DifficultyLevel,
}

/// A chapter of a course. `position` defines the display order within the course.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub video_url: Option<String>,
    pub text_content: Option<String>,
    pub duration_minutes: i32,
    pub position: i32,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub module_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub video_url: Option<String>,
    pub text_content: Option<String>,
    pub duration_minutes: i32,
    pub position: i32,
    pub is_preview: bool,
}

#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub description: String,
    /// Percentage needed to pass.
    pub passing_score: i32,
    pub time_limit_minutes: i32,
    pub attempts_allowed: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub lesson_id: Uuid,
    pub title: String,
    pub description: String,
    pub passing_score: i32,
    pub time_limit_minutes: i32,
    pub attempts_allowed: i32,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub answer_text: String,
    pub is_correct: bool,
    pub position: i32,
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress_percentage: f64,
}

//=========================================================================================
// Progress Tracking
//=========================================================================================

#[derive(Debug, Clone)]
pub struct LessonProgress {
    pub id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub is_completed: bool,
    pub time_spent_minutes: i32,
    pub completion_percentage: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub student_id: Uuid,
    pub quiz_id: Uuid,
    pub score: f64,
    pub total_points: i64,
    pub is_passed: bool,
    pub time_taken_minutes: i32,
    pub attempt_number: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct QuizAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_answer: String,
    pub is_correct: bool,
    pub points_earned: i32,
}

//=========================================================================================
// Video Conferencing
//=========================================================================================

/// A scheduled or live video session. `id` is the public room identifier.
#[derive(Debug, Clone)]
pub struct ConferenceRoom {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub host_id: Uuid,
    pub course_id: Option<Uuid>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub status: ConferenceStatus,
    pub max_participants: i32,
    pub is_recorded: bool,
    pub recording_url: Option<String>,
    pub meeting_url: String,
    pub meeting_password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConferenceParticipant {
    pub id: Uuid,
    pub conference_id: Uuid,
    pub user_id: Uuid,
    pub role: ParticipantRole,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
    pub is_invited: bool,
    pub invitation_sent: bool,
}

impl ConferenceParticipant {
    /// Joined and has not left since.
    pub fn is_present(&self) -> bool {
        self.joined_at.is_some() && self.left_at.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ConferenceRecording {
    pub id: Uuid,
    pub conference_id: Uuid,
    pub recording_id: String,
    pub file_url: String,
    pub file_size_mb: f64,
    pub duration_minutes: i32,
    pub is_public: bool,
    pub download_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conference_id: Uuid,
    pub sender_id: Uuid,
    pub message: String,
    pub is_private: bool,
    pub recipient_id: Option<Uuid>,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        !self.is_private || self.sender_id == user_id || self.recipient_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_text_forms_parse_back() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert_eq!(
            "multiple_choice".parse::<QuestionType>().unwrap(),
            QuestionType::MultipleChoice
        );
        let err = "principal".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "unknown role 'principal'");
    }

    #[test]
    fn conference_status_only_moves_forward() {
        assert!(ConferenceStatus::Scheduled.can_start());
        assert!(!ConferenceStatus::Active.can_start());
        assert!(!ConferenceStatus::Ended.can_start());
        assert!(ConferenceStatus::Active.can_end());
        assert!(!ConferenceStatus::Scheduled.can_end());
        assert!(!ConferenceStatus::Cancelled.can_end());
        assert!(ConferenceStatus::Scheduled.can_cancel());
        assert!(!ConferenceStatus::Active.can_cancel());
        assert!(ConferenceStatus::Ended.is_closed());
    }

    #[test]
    fn private_chat_is_only_visible_to_its_parties() {
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let message = ChatMessage {
            id: Uuid::new_v4(),
            conference_id: Uuid::new_v4(),
            sender_id: sender,
            message: "psst".to_string(),
            is_private: true,
            recipient_id: Some(recipient),
            sent_at: Utc::now(),
        };
        assert!(message.is_visible_to(sender));
        assert!(message.is_visible_to(recipient));
        assert!(!message.is_visible_to(Uuid::new_v4()));
    }
}
