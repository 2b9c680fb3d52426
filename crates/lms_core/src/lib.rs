pub mod access;
pub mod domain;
pub mod ports;
pub mod rules;

pub use access::{can_edit_course, check_permission, permissions_for, Permission};
pub use domain::{
    Answer, ChatMessage, ConferenceParticipant, ConferenceRecording, ConferenceRoom,
    ConferenceStatus, ContentType, Course, DifficultyLevel, Enrollment, Lesson, LessonProgress,
    Module, NewCourse, NewLesson, NewQuiz, NewUser, ParseEnumError, ParticipantRole,
    ProfileUpdate, Question, QuestionType, Quiz, QuizAnswer, QuizAttempt, Role, User,
    UserCredentials,
};
pub use ports::{
    ConferenceRepository, CourseRepository, DatabaseService, PortError, PortResult,
    ProgressRepository, UserRepository,
};
