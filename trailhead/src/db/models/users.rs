//! Database models for users.

use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    /// Asset reference stored in the avatar column. Callers resolve this to
    /// either an uploaded file URL or the shared default before the insert.
    pub avatar: String,
}

/// Database request for updating a user.
///
/// `None` fields are left untouched; the repository only writes the columns
/// that are present.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
}

impl UserUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.avatar.is_none() && self.password_hash.is_none()
    }
}

/// Database response for a user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    #[sqlx(rename = "user_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub avatar: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
