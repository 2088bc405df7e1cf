//! Common type definitions.
//!
//! Entity identifiers are `BIGSERIAL` columns in PostgreSQL, so they surface
//! here as `i64` aliases:
//!
//! - [`UserId`]: user account identifier
//! - [`HikeId`]: hike identifier
//! - [`ObservationId`]: observation identifier
//!
//! [`Operation`] names the action a handler was attempting when an
//! authorization check failed; it only exists to make `Forbidden` errors
//! read well in logs and responses.

use std::fmt;

// Type aliases for IDs
pub type UserId = i64;
pub type HikeId = i64;
pub type ObservationId = i64;

/// Actions that ownership checks guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}
