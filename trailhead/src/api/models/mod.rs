//! API request/response models.
//!
//! Wire shapes use camelCase field names. Multipart endpoints collect their
//! text fields into `*Form` structs whose `validate` methods produce the
//! database requests in [`crate::db::models`].

pub mod auth;
pub mod hikes;
pub mod observations;
pub mod users;
