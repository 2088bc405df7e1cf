//! Route handlers.

use axum::extract::multipart::Field;
use axum::Json;
use chrono::Utc;

use crate::errors::{Error, Result};

pub mod auth;
pub mod hikes;
pub mod observations;

/// Read a multipart text field, naming the field in the error message.
pub(crate) async fn text_field(field: Field<'_>) -> Result<String> {
    let name = field.name().unwrap_or("field").to_string();
    field.text().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to read {name}: {e}"),
    })
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "API is running",
        "timestamp": Utc::now(),
        "database": "PostgreSQL",
    }))
}
