//! Database models for observations.

use crate::types::{HikeId, ObservationId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new observation
#[derive(Debug, Clone)]
pub struct ObservationCreateDBRequest {
    pub hike_id: HikeId,
    pub user_id: UserId,
    pub observation: String,
    pub observation_time: DateTime<Utc>,
    pub comments: Option<String>,
    pub observation_type: Option<String>,
    pub photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// What to do with the photo column on update.
///
/// The stale-file reaping that goes with `Clear` and `Set` happens at the
/// handler layer, after the update commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PhotoUpdate {
    #[default]
    Unchanged,
    Clear,
    Set(String),
}

impl PhotoUpdate {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, PhotoUpdate::Unchanged)
    }
}

/// Database request for updating an observation. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ObservationUpdateDBRequest {
    pub observation: Option<String>,
    pub observation_time: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub observation_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: PhotoUpdate,
}

impl ObservationUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.observation.is_none()
            && self.observation_time.is_none()
            && self.comments.is_none()
            && self.observation_type.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.photo.is_unchanged()
    }
}

/// Database response for an observation, joined with the author's public
/// profile and the owning hike's name and location.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ObservationDBResponse {
    #[sqlx(rename = "observation_id")]
    pub id: ObservationId,
    pub hike_id: HikeId,
    pub user_id: UserId,
    pub observation: String,
    pub observation_time: DateTime<Utc>,
    pub comments: Option<String>,
    pub observation_type: Option<String>,
    pub photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_username: Option<String>,
    pub author_avatar: Option<String>,
    pub author_email: Option<String>,
    pub hike_name: Option<String>,
    pub hike_location: Option<String>,
}
