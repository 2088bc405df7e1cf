//! Database models for hikes.

use crate::types::{HikeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};

/// Database request for creating a new hike
#[derive(Debug, Clone)]
pub struct HikeCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub location: String,
    pub hike_date: NaiveDate,
    pub parking_available: bool,
    pub length: f64,
    pub difficulty_level: String,
    pub description: Option<String>,
    pub estimated_duration: Option<String>,
    pub elevation_gain: Option<i32>,
    pub trail_type: Option<String>,
    pub equipment_needed: Option<String>,
    pub weather_conditions: Option<String>,
}

/// Database request for updating a hike. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct HikeUpdateDBRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub hike_date: Option<NaiveDate>,
    pub parking_available: Option<bool>,
    pub length: Option<f64>,
    pub difficulty_level: Option<String>,
    pub description: Option<String>,
    pub estimated_duration: Option<String>,
    pub elevation_gain: Option<i32>,
    pub trail_type: Option<String>,
    pub equipment_needed: Option<String>,
    pub weather_conditions: Option<String>,
}

impl HikeUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.hike_date.is_none()
            && self.parking_available.is_none()
            && self.length.is_none()
            && self.difficulty_level.is_none()
            && self.description.is_none()
            && self.estimated_duration.is_none()
            && self.elevation_gain.is_none()
            && self.trail_type.is_none()
            && self.equipment_needed.is_none()
            && self.weather_conditions.is_none()
    }
}

/// Database response for a hike, joined with its author's public profile.
///
/// The author columns come from a LEFT JOIN on users, so they stay optional
/// even though every hike row carries a user_id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HikeDBResponse {
    #[sqlx(rename = "hike_id")]
    pub id: HikeId,
    pub user_id: UserId,
    pub name: String,
    pub location: String,
    pub hike_date: NaiveDate,
    pub parking_available: bool,
    pub length: f64,
    pub difficulty_level: String,
    pub description: Option<String>,
    pub estimated_duration: Option<String>,
    pub elevation_gain: Option<i32>,
    pub trail_type: Option<String>,
    pub equipment_needed: Option<String>,
    pub weather_conditions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_username: Option<String>,
    pub author_avatar: Option<String>,
    pub author_email: Option<String>,
}
