//! User models for mock credential login.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::BilingualLabel;

/// Longest display name the `uploaded_by` and `reviewed_by` columns hold.
pub const MAX_USER_NAME_LEN: usize = 100;

/// Lab roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Technician,
    Engineer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technician => "technician",
            Self::Engineer => "engineer",
        }
    }

    pub fn label(&self) -> BilingualLabel {
        match self {
            Self::Technician => BilingualLabel::new("فني المختبر", "Lab Technician"),
            Self::Engineer => BilingualLabel::new("المهندس المسؤول", "Responsible Engineer"),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated lab user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_engineer(&self) -> bool {
        matches!(self.role, UserRole::Engineer)
    }
}

/// A login-capable account in the mock credential store.
#[derive(Clone)]
pub struct UserAccount {
    pub user: User,
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("user", &self.user)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Account entry as written in `LAB_USERS`.
#[derive(Deserialize)]
pub struct UserAccountEntry {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub username: String,
    pub password: String,
}

impl From<UserAccountEntry> for UserAccount {
    fn from(entry: UserAccountEntry) -> Self {
        Self {
            user: User::new(entry.id, entry.name, entry.role),
            username: entry.username,
            password: SecretString::from(entry.password),
        }
    }
}

/// Login request body.
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    #[serde(deserialize_with = "deserialize_secret")]
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
}

/// Wrap a plain string field in `SecretString` as soon as it is parsed.
fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// User info response (returned by /auth/me and /auth/login).
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub role_label: BilingualLabel,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            role_label: u.role.label(),
            id: u.id,
            name: u.name,
            role: u.role,
        }
    }
}

/// Login response with the session token.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Opaque session token, also set as the `lab_session` cookie.
    pub token: String,
    pub user: UserResponse,
}
