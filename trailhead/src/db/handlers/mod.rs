//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the
//! system. Repositories follow a consistent pattern and implement the
//! [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Users`]: user accounts and credential lookups
//! - [`Hikes`]: hike logs, listings, and search
//! - [`Observations`]: trail observations attached to hikes
//!
//! # Common Pattern
//!
//! All repositories follow this usage pattern:
//!
//! ```ignore
//! use trailhead::db::handlers::{Hikes, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Hikes::new(&mut conn);
//!     let hike = repo.get_by_id(42).await?;
//!     Ok(())
//! }
//! ```

pub mod hikes;
pub mod observations;
pub mod repository;
pub mod users;

pub use hikes::Hikes;
pub use observations::Observations;
pub use repository::Repository;
pub use users::Users;
