//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated caller, decoded from the session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// A user's own profile as returned to them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

/// Another user's profile: no contact details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserResponse {
    pub user_id: UserId,
    pub username: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            user_id: db.id,
            username: db.username,
            email: db.email,
            phone: db.phone,
            avatar: db.avatar,
            created_at: db.created_at,
        }
    }
}

impl From<UserDBResponse> for PublicUserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            user_id: db.id,
            username: db.username,
            avatar: db.avatar,
            created_at: db.created_at,
        }
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
        }
    }
}
