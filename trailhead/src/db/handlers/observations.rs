//! Database repository for observations.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::observations::{ObservationCreateDBRequest, ObservationDBResponse, ObservationUpdateDBRequest, PhotoUpdate},
};
use crate::types::{HikeId, ObservationId, UserId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing observations, either per hike or per author.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub hike_id: Option<HikeId>,
    pub user_id: Option<UserId>,
}

impl ObservationFilter {
    pub fn for_hike(hike_id: HikeId) -> Self {
        Self {
            hike_id: Some(hike_id),
            user_id: None,
        }
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            hike_id: None,
            user_id: Some(user_id),
        }
    }
}

/// Joined select shared by the read paths: author profile plus the owning
/// hike's name and location.
const OBSERVATION_SELECT: &str = "SELECT o.*, u.username AS author_username, u.avatar AS author_avatar, u.email AS author_email, \
     h.name AS hike_name, h.location AS hike_location \
     FROM observations o \
     LEFT JOIN users u ON o.user_id = u.user_id \
     LEFT JOIN hikes h ON o.hike_id = h.hike_id";

pub struct Observations<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Observations<'c> {
    type CreateRequest = ObservationCreateDBRequest;
    type UpdateRequest = ObservationUpdateDBRequest;
    type Response = ObservationDBResponse;
    type Id = ObservationId;
    type Filter = ObservationFilter;

    #[instrument(skip(self, request), fields(hike_id = request.hike_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let observation_id = sqlx::query_scalar::<_, ObservationId>(
            r#"
            INSERT INTO observations (
                hike_id, user_id, observation, observation_time, comments,
                observation_type, photo_url, latitude, longitude
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING observation_id
            "#,
        )
        .bind(request.hike_id)
        .bind(request.user_id)
        .bind(&request.observation)
        .bind(request.observation_time)
        .bind(&request.comments)
        .bind(&request.observation_type)
        .bind(&request.photo_url)
        .bind(request.latitude)
        .bind(request.longitude)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(observation_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(observation_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let observation = sqlx::query_as::<_, ObservationDBResponse>(&format!("{OBSERVATION_SELECT} WHERE o.observation_id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(observation)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(OBSERVATION_SELECT);
        query.push(" WHERE 1=1");

        if let Some(hike_id) = filter.hike_id {
            query.push(" AND o.hike_id = ");
            query.push_bind(hike_id);
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND o.user_id = ");
            query.push_bind(user_id);
        }
        query.push(" ORDER BY o.observation_time DESC");

        let observations = query
            .build_query_as::<ObservationDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(observations)
    }

    #[instrument(skip(self), fields(observation_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM observations WHERE observation_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(observation_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut query = QueryBuilder::new("UPDATE observations SET ");
        let mut updates = query.separated(", ");

        if let Some(observation) = &request.observation {
            updates.push("observation = ");
            updates.push_bind_unseparated(observation.clone());
        }
        if let Some(observation_time) = request.observation_time {
            updates.push("observation_time = ");
            updates.push_bind_unseparated(observation_time);
        }
        if let Some(comments) = &request.comments {
            updates.push("comments = ");
            updates.push_bind_unseparated(comments.clone());
        }
        if let Some(observation_type) = &request.observation_type {
            updates.push("observation_type = ");
            updates.push_bind_unseparated(observation_type.clone());
        }
        if let Some(latitude) = request.latitude {
            updates.push("latitude = ");
            updates.push_bind_unseparated(latitude);
        }
        if let Some(longitude) = request.longitude {
            updates.push("longitude = ");
            updates.push_bind_unseparated(longitude);
        }
        match &request.photo {
            PhotoUpdate::Unchanged => {}
            PhotoUpdate::Clear => {
                updates.push("photo_url = NULL");
            }
            PhotoUpdate::Set(url) => {
                updates.push("photo_url = ");
                updates.push_bind_unseparated(url.clone());
            }
        }
        updates.push("updated_at = NOW()");

        query.push(" WHERE observation_id = ");
        query.push_bind(id);
        query.push(" RETURNING observation_id");

        query
            .build_query_scalar::<ObservationId>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Observations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
