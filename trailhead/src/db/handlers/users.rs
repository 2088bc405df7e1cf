//! Database repository for users.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::UserId;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (username, email, password_hash, phone, avatar)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.phone)
        .bind(&request.avatar)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE user_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Build the SET clause from the fields that are actually present,
        // the same whitelist approach the API layer validates against.
        let mut query = QueryBuilder::new("UPDATE users SET ");
        let mut updates = query.separated(", ");

        if let Some(email) = &request.email {
            updates.push("email = ");
            updates.push_bind_unseparated(email.clone());
        }
        if let Some(phone) = &request.phone {
            updates.push("phone = ");
            updates.push_bind_unseparated(phone.clone());
        }
        if let Some(avatar) = &request.avatar {
            updates.push("avatar = ");
            updates.push_bind_unseparated(avatar.clone());
        }
        if let Some(password_hash) = &request.password_hash {
            updates.push("password_hash = ");
            updates.push_bind_unseparated(password_hash.clone());
        }
        updates.push("updated_at = NOW()");

        query.push(" WHERE user_id = ");
        query.push_bind(id);
        query.push(" RETURNING *");

        let user = query
            .build_query_as::<UserDBResponse>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up an active user by email or username, for login.
    #[instrument(skip_all, err)]
    pub async fn find_for_login(&mut self, identifier: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE (email = $1 OR username = $1) AND is_active = TRUE")
            .bind(identifier)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Whether a username or email is already registered.
    #[instrument(skip_all, err)]
    pub async fn identity_exists(&mut self, username: &str, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)")
            .bind(username)
            .bind(email)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Whether an email belongs to a different user than the one given.
    #[instrument(skip_all, err)]
    pub async fn email_taken_by_other(&mut self, email: &str, user_id: UserId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND user_id != $2)")
            .bind(email)
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn sample_user(name: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "$argon2id$fake".to_string(),
            phone: None,
            avatar: "default_avatar.png".to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&sample_user("alice")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.avatar, "default_avatar.png");
        assert!(user.is_active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_username_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&sample_user("bob")).await.unwrap();

        let mut duplicate = sample_user("bob");
        duplicate.email = "other@example.com".to_string();
        let err = repo.create(&duplicate).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_for_login_by_email_and_username(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&sample_user("carol")).await.unwrap();

        let by_email = repo.find_for_login("carol@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_username = repo.find_for_login("carol").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);

        assert!(repo.find_for_login("nobody").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_touches_only_present_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&sample_user("dave")).await.unwrap();

        let update = UserUpdateDBRequest {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.avatar, created.avatar);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_user_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let update = UserUpdateDBRequest {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        let err = repo.update(9999, &update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_email_taken_by_other(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let erin = repo.create(&sample_user("erin")).await.unwrap();
        let frank = repo.create(&sample_user("frank")).await.unwrap();

        assert!(repo.email_taken_by_other("erin@example.com", frank.id).await.unwrap());
        assert!(!repo.email_taken_by_other("erin@example.com", erin.id).await.unwrap());
        assert!(!repo.email_taken_by_other("new@example.com", erin.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_users(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&sample_user("gina")).await.unwrap();
        repo.create(&sample_user("hank")).await.unwrap();

        let users = repo.list(&UserFilter::new(0, 10)).await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
