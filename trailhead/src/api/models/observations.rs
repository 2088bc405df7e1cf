//! API request/response models for observations.

use crate::db::models::observations::{ObservationCreateDBRequest, ObservationDBResponse, ObservationUpdateDBRequest, PhotoUpdate};
use crate::errors::{Error, Result};
use crate::types::{HikeId, ObservationId, UserId};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Categories an observation can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ObservationType {
    Wildlife,
    Vegetation,
    Weather,
    #[serde(rename = "Trail Condition")]
    TrailCondition,
    Other,
}

impl ObservationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationType::Wildlife => "Wildlife",
            ObservationType::Vegetation => "Vegetation",
            ObservationType::Weather => "Weather",
            ObservationType::TrailCondition => "Trail Condition",
            ObservationType::Other => "Other",
        }
    }
}

impl FromStr for ObservationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Wildlife" => Ok(ObservationType::Wildlife),
            "Vegetation" => Ok(ObservationType::Vegetation),
            "Weather" => Ok(ObservationType::Weather),
            "Trail Condition" => Ok(ObservationType::TrailCondition),
            "Other" => Ok(ObservationType::Other),
            _ => Err(Error::BadRequest {
                message: "Invalid observation type. Must be: Wildlife, Vegetation, Weather, Trail Condition, or Other".to_string(),
            }),
        }
    }
}

impl fmt::Display for ObservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create-observation fields, collected from the multipart form alongside
/// the optional photo file. Everything arrives as text and is parsed here.
#[derive(Debug, Clone, Default)]
pub struct ObservationCreateForm {
    pub observation: Option<String>,
    pub observation_time: Option<String>,
    pub comments: Option<String>,
    pub observation_type: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl ObservationCreateForm {
    /// Validate into a database insert. The photo URL is supplied by the
    /// handler once the upload (if any) has been received.
    pub fn validate(self, hike_id: HikeId, user_id: UserId, photo_url: Option<String>) -> Result<ObservationCreateDBRequest> {
        let mut errors = Vec::new();

        let observation = self.observation.unwrap_or_default().trim().to_string();
        if observation.is_empty() {
            errors.push("Observation is required".to_string());
        }

        let observation_time = match self.observation_time.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => match parse_timestamp(raw) {
                Ok(ts) => ts,
                Err(_) => {
                    errors.push("Valid observation time is required".to_string());
                    Utc::now()
                }
            },
            None => Utc::now(),
        };

        let observation_type = match self.observation_type.as_deref().filter(|s| !s.is_empty()).map(ObservationType::from_str) {
            Some(Ok(t)) => Some(t.as_str().to_string()),
            Some(Err(e)) => {
                errors.push(e.user_message());
                None
            }
            None => None,
        };

        let latitude = match parse_coordinate(self.latitude.as_deref(), -90.0..=90.0) {
            Ok(value) => value,
            Err(_) => {
                errors.push("Valid latitude is required (-90 to 90)".to_string());
                None
            }
        };
        let longitude = match parse_coordinate(self.longitude.as_deref(), -180.0..=180.0) {
            Ok(value) => value,
            Err(_) => {
                errors.push("Valid longitude is required (-180 to 180)".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Err(Error::BadRequest {
                message: errors.join("; "),
            });
        }

        Ok(ObservationCreateDBRequest {
            hike_id,
            user_id,
            observation,
            observation_time,
            comments: self.comments.filter(|c| !c.trim().is_empty()),
            observation_type,
            photo_url,
            latitude,
            longitude,
        })
    }
}

/// Update-observation fields from the multipart form. `delete_photo` and a
/// fresh photo upload are mutually exclusive ways of changing the photo
/// column; both trigger reaping of the old file after the update commits.
#[derive(Debug, Clone, Default)]
pub struct ObservationUpdateForm {
    pub observation: Option<String>,
    pub observation_time: Option<String>,
    pub comments: Option<String>,
    pub observation_type: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub delete_photo: bool,
}

impl ObservationUpdateForm {
    /// Validate into a database update. The photo transition is decided by
    /// the handler and injected afterwards.
    pub fn validate(self) -> Result<ObservationUpdateDBRequest> {
        let mut errors = Vec::new();

        if let Some(observation) = &self.observation {
            if observation.trim().is_empty() {
                errors.push("Observation cannot be empty".to_string());
            }
        }

        let observation_time = match self.observation_time.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => match parse_timestamp(raw) {
                Ok(ts) => Some(ts),
                Err(_) => {
                    errors.push("Valid observation time is required".to_string());
                    None
                }
            },
            None => None,
        };

        let observation_type = match self.observation_type.as_deref().filter(|s| !s.is_empty()).map(ObservationType::from_str) {
            Some(Ok(t)) => Some(t.as_str().to_string()),
            Some(Err(e)) => {
                errors.push(e.user_message());
                None
            }
            None => None,
        };

        let latitude = match parse_coordinate(self.latitude.as_deref(), -90.0..=90.0) {
            Ok(value) => value,
            Err(_) => {
                errors.push("Valid latitude is required (-90 to 90)".to_string());
                None
            }
        };
        let longitude = match parse_coordinate(self.longitude.as_deref(), -180.0..=180.0) {
            Ok(value) => value,
            Err(_) => {
                errors.push("Valid longitude is required (-180 to 180)".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Err(Error::BadRequest {
                message: errors.join("; "),
            });
        }

        Ok(ObservationUpdateDBRequest {
            observation: self.observation.map(|o| o.trim().to_string()),
            observation_time,
            comments: self.comments,
            observation_type,
            latitude,
            longitude,
            photo: PhotoUpdate::Unchanged,
        })
    }
}

/// An observation as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObservationResponse {
    pub observation_id: ObservationId,
    pub hike_id: HikeId,
    pub user_id: UserId,
    pub observation: String,
    pub observation_time: DateTime<Utc>,
    pub comments: Option<String>,
    pub observation_type: Option<String>,
    pub photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub username: Option<String>,
    pub user_avatar: Option<String>,
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hike_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hike_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ObservationResponse {
    /// Drop the hike join columns; used by the per-hike listing where the
    /// hike is already known from the URL.
    pub fn without_hike_details(mut self) -> Self {
        self.hike_name = None;
        self.hike_location = None;
        self
    }
}

impl From<ObservationDBResponse> for ObservationResponse {
    fn from(db: ObservationDBResponse) -> Self {
        Self {
            observation_id: db.id,
            hike_id: db.hike_id,
            user_id: db.user_id,
            observation: db.observation,
            observation_time: db.observation_time,
            comments: db.comments,
            observation_type: db.observation_type,
            photo_url: db.photo_url,
            latitude: db.latitude,
            longitude: db.longitude,
            username: db.author_username,
            user_avatar: db.author_avatar,
            user_email: db.author_email,
            hike_name: db.hike_name,
            hike_location: db.hike_location,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ObservationListResponse {
    pub count: usize,
    pub observations: Vec<ObservationResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObservationCreateResponse {
    pub message: String,
    pub observation_id: ObservationId,
    pub observation: ObservationResponse,
}

/// Parse an observation timestamp, accepting RFC 3339 and a bare
/// `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(Error::BadRequest {
        message: "Valid observation time is required".to_string(),
    })
}

fn parse_coordinate(raw: Option<&str>, range: std::ops::RangeInclusive<f64>) -> Result<Option<f64>> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let value: f64 = raw.parse().map_err(|_| Error::BadRequest {
        message: "Invalid coordinate".to_string(),
    })?;
    if !range.contains(&value) {
        return Err(Error::BadRequest {
            message: "Coordinate out of range".to_string(),
        });
    }
    Ok(Some(value))
}
