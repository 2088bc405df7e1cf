//! API request/response models for hikes.

use crate::db::models::hikes::{HikeCreateDBRequest, HikeDBResponse, HikeUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{HikeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Difficulty grades a hike can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Easy,
    Moderate,
    Difficult,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Moderate => "Moderate",
            Difficulty::Difficult => "Difficult",
            Difficulty::Expert => "Expert",
        }
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Moderate" => Ok(Difficulty::Moderate),
            "Difficult" => Ok(Difficulty::Difficult),
            "Expert" => Ok(Difficulty::Expert),
            _ => Err(Error::BadRequest {
                message: "Invalid difficulty level. Must be: Easy, Moderate, Difficult, or Expert".to_string(),
            }),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create-hike request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HikeCreate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub hike_date: Option<String>,
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

impl HikeCreate {
    /// Validate the request into a database insert for the given owner.
    pub fn validate(self, user_id: UserId) -> Result<HikeCreateDBRequest> {
        let mut errors = Vec::new();

        let name = self.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            errors.push("Hike name is required".to_string());
        }

        let location = self.location.unwrap_or_default().trim().to_string();
        if location.is_empty() {
            errors.push("Location is required".to_string());
        }

        let hike_date = match self.hike_date.as_deref().map(parse_date) {
            Some(Ok(date)) => Some(date),
            Some(Err(_)) | None => {
                errors.push("Valid date is required".to_string());
                None
            }
        };

        if self.parking_available.is_none() {
            errors.push("Parking availability is required".to_string());
        }

        let length = self.length.unwrap_or(0.0);
        if !(length > 0.0) {
            errors.push("Length must be a positive number".to_string());
        }

        let difficulty = match self.difficulty_level.as_deref().map(Difficulty::from_str) {
            Some(Ok(difficulty)) => Some(difficulty),
            Some(Err(e)) => {
                errors.push(e.user_message());
                None
            }
            None => {
                errors.push("Invalid difficulty level. Must be: Easy, Moderate, Difficult, or Expert".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Err(Error::BadRequest {
                message: errors.join("; "),
            });
        }

        Ok(HikeCreateDBRequest {
            user_id,
            name,
            location,
            hike_date: hike_date.expect("validated above"),
            parking_available: self.parking_available.expect("validated above"),
            length,
            difficulty_level: difficulty.expect("validated above").as_str().to_string(),
            description: self.description,
            estimated_duration: self.estimated_duration,
            elevation_gain: self.elevation_gain,
            trail_type: self.trail_type,
            equipment_needed: self.equipment_needed,
            weather_conditions: self.weather_conditions,
        })
    }
}

/// Update-hike request body; only present fields change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HikeUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub hike_date: Option<String>,
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

impl HikeUpdate {
    /// Validate the request into a database update.
    pub fn validate(self) -> Result<HikeUpdateDBRequest> {
        let mut errors = Vec::new();

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push("Hike name cannot be empty".to_string());
            }
        }
        if let Some(location) = &self.location {
            if location.trim().is_empty() {
                errors.push("Location cannot be empty".to_string());
            }
        }

        let hike_date = match self.hike_date.as_deref().map(parse_date) {
            Some(Ok(date)) => Some(date),
            Some(Err(_)) => {
                errors.push("Valid date is required".to_string());
                None
            }
            None => None,
        };

        if let Some(length) = self.length {
            if !(length > 0.0) {
                errors.push("Length must be a positive number".to_string());
            }
        }

        let difficulty = match self.difficulty_level.as_deref().map(Difficulty::from_str) {
            Some(Ok(difficulty)) => Some(difficulty),
            Some(Err(e)) => {
                errors.push(e.user_message());
                None
            }
            None => None,
        };

        if !errors.is_empty() {
            return Err(Error::BadRequest {
                message: errors.join("; "),
            });
        }

        Ok(HikeUpdateDBRequest {
            name: self.name.map(|n| n.trim().to_string()),
            location: self.location.map(|l| l.trim().to_string()),
            hike_date,
            parking_available: self.parking_available,
            length: self.length,
            difficulty_level: difficulty.map(|d| d.as_str().to_string()),
            description: self.description,
            estimated_duration: self.estimated_duration,
            elevation_gain: self.elevation_gain,
            trail_type: self.trail_type,
            equipment_needed: self.equipment_needed,
            weather_conditions: self.weather_conditions,
        })
    }
}

/// A hike as returned by the API, with its author's public details.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HikeResponse {
    pub hike_id: HikeId,
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
    pub username: Option<String>,
    pub user_avatar: Option<String>,
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HikeDBResponse> for HikeResponse {
    fn from(db: HikeDBResponse) -> Self {
        Self {
            hike_id: db.id,
            user_id: db.user_id,
            name: db.name,
            location: db.location,
            hike_date: db.hike_date,
            parking_available: db.parking_available,
            length: db.length,
            difficulty_level: db.difficulty_level,
            description: db.description,
            estimated_duration: db.estimated_duration,
            elevation_gain: db.elevation_gain,
            trail_type: db.trail_type,
            equipment_needed: db.equipment_needed,
            weather_conditions: db.weather_conditions,
            username: db.author_username,
            user_avatar: db.author_avatar,
            user_email: db.author_email,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HikeListResponse {
    pub count: usize,
    pub hikes: Vec<HikeResponse>,
}

impl HikeListResponse {
    pub fn new(hikes: Vec<HikeDBResponse>) -> Self {
        let hikes: Vec<HikeResponse> = hikes.into_iter().map(HikeResponse::from).collect();
        Self { count: hikes.len(), hikes }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HikeCreateResponse {
    pub message: String,
    pub hike_id: HikeId,
    pub hike: HikeResponse,
}

/// Query parameters for listing other users' hikes.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListAllHikesQuery {
    pub difficulty: Option<String>,
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for name search.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct SearchNameQuery {
    pub name: Option<String>,
}

/// Query parameters for the combinable advanced search.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct AdvancedSearchQuery {
    pub name: Option<String>,
    pub location: Option<String>,
    pub length: Option<f64>,
    pub date: Option<String>,
}

/// Parse a hike date, accepting plain dates and full timestamps.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    Err(Error::BadRequest {
        message: "Valid date is required".to_string(),
    })
}
