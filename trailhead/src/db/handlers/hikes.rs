//! Database repository for hikes.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::hikes::{HikeCreateDBRequest, HikeDBResponse, HikeUpdateDBRequest},
};
use crate::types::{HikeId, UserId};
use chrono::NaiveDate;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Whose hikes a listing should cover.
#[derive(Debug, Clone, Copy)]
pub enum HikeScope {
    /// Hikes logged by this user
    OwnedBy(UserId),
    /// Hikes logged by everyone except this user
    NotOwnedBy(UserId),
}

#[derive(Debug, Clone, Copy, Default)]
pub enum HikeOrder {
    #[default]
    NewestFirst,
    Name,
}

/// Filter for listing hikes.
///
/// One filter covers the plain listings and both search endpoints; unset
/// fields simply don't constrain the query.
#[derive(Debug, Clone)]
pub struct HikeFilter {
    pub scope: HikeScope,
    pub name: Option<String>,
    pub location: Option<String>,
    pub difficulty: Option<String>,
    pub length: Option<f64>,
    pub date: Option<NaiveDate>,
    pub order: HikeOrder,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl HikeFilter {
    pub fn owned_by(user_id: UserId) -> Self {
        Self::scoped(HikeScope::OwnedBy(user_id))
    }

    pub fn excluding(user_id: UserId) -> Self {
        Self::scoped(HikeScope::NotOwnedBy(user_id))
    }

    fn scoped(scope: HikeScope) -> Self {
        Self {
            scope,
            name: None,
            location: None,
            difficulty: None,
            length: None,
            date: None,
            order: HikeOrder::default(),
            limit: None,
            skip: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn order_by_name(mut self) -> Self {
        self.order = HikeOrder::Name;
        self
    }

    pub fn paginate(mut self, limit: i64, skip: i64) -> Self {
        self.limit = Some(limit);
        self.skip = Some(skip);
        self
    }
}

/// Joined select used by every read path, so responses always carry the
/// author's public profile.
const HIKE_SELECT: &str = "SELECT h.*, u.username AS author_username, u.avatar AS author_avatar, u.email AS author_email \
     FROM hikes h LEFT JOIN users u ON h.user_id = u.user_id";

pub struct Hikes<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Hikes<'c> {
    type CreateRequest = HikeCreateDBRequest;
    type UpdateRequest = HikeUpdateDBRequest;
    type Response = HikeDBResponse;
    type Id = HikeId;
    type Filter = HikeFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let hike_id = sqlx::query_scalar::<_, HikeId>(
            r#"
            INSERT INTO hikes (
                user_id, name, location, hike_date, parking_available, length,
                difficulty_level, description, estimated_duration, elevation_gain,
                trail_type, equipment_needed, weather_conditions
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING hike_id
            "#,
        )
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.location)
        .bind(request.hike_date)
        .bind(request.parking_available)
        .bind(request.length)
        .bind(&request.difficulty_level)
        .bind(&request.description)
        .bind(&request.estimated_duration)
        .bind(request.elevation_gain)
        .bind(&request.trail_type)
        .bind(&request.equipment_needed)
        .bind(&request.weather_conditions)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(hike_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(hike_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let hike = sqlx::query_as::<_, HikeDBResponse>(&format!("{HIKE_SELECT} WHERE h.hike_id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(hike)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(HIKE_SELECT);
        query.push(" WHERE ");
        match filter.scope {
            HikeScope::OwnedBy(user_id) => {
                query.push("h.user_id = ");
                query.push_bind(user_id);
            }
            HikeScope::NotOwnedBy(user_id) => {
                query.push("h.user_id != ");
                query.push_bind(user_id);
            }
        }

        if let Some(name) = &filter.name {
            query.push(" AND h.name ILIKE ");
            query.push_bind(format!("%{name}%"));
        }
        if let Some(location) = &filter.location {
            query.push(" AND h.location ILIKE ");
            query.push_bind(format!("%{location}%"));
        }
        if let Some(difficulty) = &filter.difficulty {
            query.push(" AND h.difficulty_level = ");
            query.push_bind(difficulty.clone());
        }
        if let Some(length) = filter.length {
            query.push(" AND h.length = ");
            query.push_bind(length);
        }
        if let Some(date) = filter.date {
            query.push(" AND h.hike_date = ");
            query.push_bind(date);
        }

        match filter.order {
            HikeOrder::NewestFirst => query.push(" ORDER BY h.created_at DESC"),
            HikeOrder::Name => query.push(" ORDER BY h.name"),
        };

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
            if let Some(skip) = filter.skip {
                query.push(" OFFSET ");
                query.push_bind(skip);
            }
        }

        let hikes = query.build_query_as::<HikeDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(hikes)
    }

    #[instrument(skip(self), fields(hike_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM hikes WHERE hike_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(hike_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut query = QueryBuilder::new("UPDATE hikes SET ");
        let mut updates = query.separated(", ");

        if let Some(name) = &request.name {
            updates.push("name = ");
            updates.push_bind_unseparated(name.clone());
        }
        if let Some(location) = &request.location {
            updates.push("location = ");
            updates.push_bind_unseparated(location.clone());
        }
        if let Some(hike_date) = request.hike_date {
            updates.push("hike_date = ");
            updates.push_bind_unseparated(hike_date);
        }
        if let Some(parking_available) = request.parking_available {
            updates.push("parking_available = ");
            updates.push_bind_unseparated(parking_available);
        }
        if let Some(length) = request.length {
            updates.push("length = ");
            updates.push_bind_unseparated(length);
        }
        if let Some(difficulty_level) = &request.difficulty_level {
            updates.push("difficulty_level = ");
            updates.push_bind_unseparated(difficulty_level.clone());
        }
        if let Some(description) = &request.description {
            updates.push("description = ");
            updates.push_bind_unseparated(description.clone());
        }
        if let Some(estimated_duration) = &request.estimated_duration {
            updates.push("estimated_duration = ");
            updates.push_bind_unseparated(estimated_duration.clone());
        }
        if let Some(elevation_gain) = request.elevation_gain {
            updates.push("elevation_gain = ");
            updates.push_bind_unseparated(elevation_gain);
        }
        if let Some(trail_type) = &request.trail_type {
            updates.push("trail_type = ");
            updates.push_bind_unseparated(trail_type.clone());
        }
        if let Some(equipment_needed) = &request.equipment_needed {
            updates.push("equipment_needed = ");
            updates.push_bind_unseparated(equipment_needed.clone());
        }
        if let Some(weather_conditions) = &request.weather_conditions {
            updates.push("weather_conditions = ");
            updates.push_bind_unseparated(weather_conditions.clone());
        }
        updates.push("updated_at = NOW()");

        query.push(" WHERE hike_id = ");
        query.push_bind(id);
        query.push(" RETURNING hike_id");

        query
            .build_query_scalar::<HikeId>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Hikes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Whether a hike row exists at all, for the paths that don't need the
    /// full joined response.
    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, id: HikeId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM hikes WHERE hike_id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }
}
