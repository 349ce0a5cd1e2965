use crate::domain::user::{self, MIN_PASSWORD_LEN, User, UserUpdate};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Public view of an account. The provider subject id is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            email_verified: u.email_verified,
            created_at: u.created_at,
            updated_at: u.updated_at,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = String;

    /// An empty email means "leave unchanged".
    fn try_from(req: UpdateUserRequest) -> Result<Self, Self::Error> {
        let email = req.email.filter(|e| !e.is_empty());
        if let Some(email) = &email {
            validate_email(email)?;
        }
        Ok(Self { email, is_active: req.is_active })
    }
}

/// Raw pagination parameters; unparseable values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListUsersQuery {
    pub fn parsed(&self) -> (Option<i64>, Option<i64>) {
        (
            self.page.as_deref().and_then(|p| p.parse().ok()),
            self.limit.as_deref().and_then(|l| l.parse().ok()),
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: UserResponse,
}

pub(crate) fn validate_email(email: &str) -> Result<(), String> {
    if user::is_valid_email(email) { Ok(()) } else { Err("Invalid email address".to_string()) }
}

pub(crate) fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    Ok(())
}
