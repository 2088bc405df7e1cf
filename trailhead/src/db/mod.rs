//! Database access layer.
//!
//! Organized as one repository per entity (the repository pattern): each
//! repository wraps a `PgConnection`, provides strongly-typed CRUD
//! operations, and returns domain models from [`models`]. Error
//! categorization lives in [`errors`].

pub mod errors;
pub mod handlers;
pub mod models;
