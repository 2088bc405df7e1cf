//! Authentication system.
//!
//! The API uses stateless JWT bearer tokens: a successful login or
//! registration returns a token, and protected handlers extract the caller
//! by adding a [`crate::api::models::users::CurrentUser`] parameter.
//!
//! # Modules
//!
//! - [`current_user`]: extractor for getting the authenticated user in handlers
//! - [`password`]: password hashing and verification using Argon2
//! - [`session`]: JWT token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use trailhead::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.username)
//! }
//! ```
//!
//! Authorization beyond authentication is ownership-based: handlers compare
//! `current_user.id` against the row's `user_id` before mutating.

pub mod current_user;
pub mod password;
pub mod session;
