//! Database entity models.
//!
//! These are the request/response types the repositories in
//! [`crate::db::handlers`] accept and return. API-facing shapes live in
//! [`crate::api::models`] and convert from these.

pub mod hikes;
pub mod observations;
pub mod users;
