//! Signed-in identities, injected into the flows that need them.
//!
//! Nothing in this crate reaches for an ambient "current user". The host
//! authenticates however it likes and hands the resulting identity to the
//! ledger or the scanner explicitly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

/// An authenticated account, as the ledger and roster flows see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The student profile a scan session marks attendance for.
///
/// `student_id` is the roster document id, not the auth account id. Committed
/// records reference the roster entry; `name` is stamped into `Marked_By`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub student_id: String,
    pub name: String,
    /// Course the student is enrolled in, checked against scanned payloads.
    pub course_id: String,
}

impl StudentIdentity {
    pub fn new(
        student_id: impl Into<String>,
        name: impl Into<String>,
        course_id: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            course_id: course_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_is_detected() {
        let session = UserSession::new("user-1", "Dr. Rao", Role::Admin);
        assert!(session.is_admin());

        let session = UserSession::new("user-2", "Asha", Role::Student);
        assert!(!session.is_admin());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&Role::Student).unwrap(),
            "\"student\""
        );
    }
}
