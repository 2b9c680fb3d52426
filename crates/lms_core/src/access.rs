//! crates/lms_core/src/access.rs
//!
//! Static role-based access control. Each role maps to a fixed list of
//! permissions; roles do not inherit from one another.

use crate::domain::{ParseEnumError, Role};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    CreateCourse,
    EditCourse,
    DeleteCourse,
    ManageUsers,
    ViewAnalytics,
    ManageSystem,
    EditOwnCourse,
    ViewCourseAnalytics,
    ManageStudents,
    CreateQuiz,
    GradeQuiz,
    ViewCourse,
    TakeQuiz,
    ViewProgress,
    JoinVideoConference,
}

const ADMIN: &[Permission] = &[
    Permission::CreateCourse,
    Permission::EditCourse,
    Permission::DeleteCourse,
    Permission::ManageUsers,
    Permission::ViewAnalytics,
    Permission::ManageSystem,
];

const INSTRUCTOR: &[Permission] = &[
    Permission::CreateCourse,
    Permission::EditOwnCourse,
    Permission::ViewCourseAnalytics,
    Permission::ManageStudents,
    Permission::CreateQuiz,
    Permission::GradeQuiz,
];

const STUDENT: &[Permission] = &[
    Permission::ViewCourse,
    Permission::TakeQuiz,
    Permission::ViewProgress,
    Permission::JoinVideoConference,
];

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateCourse => "create_course",
            Permission::EditCourse => "edit_course",
            Permission::DeleteCourse => "delete_course",
            Permission::ManageUsers => "manage_users",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageSystem => "manage_system",
            Permission::EditOwnCourse => "edit_own_course",
            Permission::ViewCourseAnalytics => "view_course_analytics",
            Permission::ManageStudents => "manage_students",
            Permission::CreateQuiz => "create_quiz",
            Permission::GradeQuiz => "grade_quiz",
            Permission::ViewCourse => "view_course",
            Permission::TakeQuiz => "take_quiz",
            Permission::ViewProgress => "view_progress",
            Permission::JoinVideoConference => "join_video_conference",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ADMIN, INSTRUCTOR, STUDENT]
            .iter()
            .flat_map(|perms| perms.iter())
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| ParseEnumError {
                kind: "permission",
                value: s.to_string(),
            })
    }
}

/// All permissions granted to `role`.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN,
        Role::Instructor => INSTRUCTOR,
        Role::Student => STUDENT,
    }
}

pub fn check_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}

/// Whether a user may author content in a course owned by `course_instructor`.
///
/// Admins hold `edit_course` and may edit any course; instructors hold
/// `edit_own_course` and may edit only the courses they teach.
pub fn can_edit_course(role: Role, user_id: uuid::Uuid, course_instructor: uuid::Uuid) -> bool {
    check_permission(role, Permission::EditCourse)
        || (check_permission(role, Permission::EditOwnCourse) && user_id == course_instructor)
}
