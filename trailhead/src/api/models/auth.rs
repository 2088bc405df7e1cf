//! API request/response models for authentication.

use crate::api::models::users::UserResponse;
use crate::config::PasswordConfig;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Registration fields, collected from the multipart form alongside the
/// optional avatar file.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

impl RegisterForm {
    /// Validate and unpack into (username, email, password, phone).
    pub fn validate(self, policy: &PasswordConfig) -> Result<(String, String, String, Option<String>)> {
        let mut errors = Vec::new();

        let username = self.username.unwrap_or_default().trim().to_string();
        if username.len() < 3 || username.len() > 50 {
            errors.push("Username must be between 3 and 50 characters".to_string());
        }

        let email = self.email.unwrap_or_default().trim().to_string();
        if !is_valid_email(&email) {
            errors.push("Valid email is required".to_string());
        }

        let password = self.password.unwrap_or_default();
        if password.len() < policy.min_length {
            errors.push(format!("Password must be at least {} characters long", policy.min_length));
        }
        if password.len() > policy.max_length {
            errors.push(format!("Password must be no more than {} characters", policy.max_length));
        }

        if !errors.is_empty() {
            return Err(Error::BadRequest {
                message: errors.join("; "),
            });
        }

        Ok((username, email, password, self.phone.filter(|p| !p.trim().is_empty())))
    }
}

/// Login with email OR username.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Validate and unpack into (identifier, password).
    pub fn validate(self) -> Result<(String, String)> {
        let mut errors = Vec::new();

        let identifier = match (&self.email, &self.username) {
            (Some(email), _) if !email.trim().is_empty() => {
                if !is_valid_email(email) {
                    errors.push("Valid email is required");
                }
                email.trim().to_string()
            }
            (_, Some(username)) if !username.trim().is_empty() => username.trim().to_string(),
            _ => {
                errors.push("Email or username is required");
                String::new()
            }
        };

        let password = self.password.unwrap_or_default();
        if password.trim().is_empty() {
            errors.push("Password is required");
        }

        if !errors.is_empty() {
            return Err(Error::BadRequest {
                message: errors.join("; "),
            });
        }

        Ok((identifier, password))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

impl ChangePasswordRequest {
    /// Validate and unpack into (old_password, new_password).
    pub fn validate(self, policy: &PasswordConfig) -> Result<(String, String)> {
        let mut errors = Vec::new();

        let old_password = self.old_password.unwrap_or_default();
        if old_password.trim().is_empty() {
            errors.push("Current password is required".to_string());
        }

        let new_password = self.new_password.unwrap_or_default();
        if new_password.len() < policy.min_length {
            errors.push(format!("New password must be at least {} characters long", policy.min_length));
        }
        if new_password.len() > policy.max_length {
            errors.push(format!("New password must be no more than {} characters", policy.max_length));
        }

        match &self.confirm_password {
            Some(confirm) if !confirm.trim().is_empty() => {
                if *confirm != new_password {
                    errors.push("Passwords do not match".to_string());
                }
            }
            _ => errors.push("Password confirmation is required".to_string()),
        }

        if !new_password.is_empty() && !old_password.is_empty() && new_password == old_password {
            errors.push("New password must be different from current password".to_string());
        }

        if !errors.is_empty() {
            return Err(Error::BadRequest {
                message: errors.join("; "),
            });
        }

        Ok((old_password, new_password))
    }
}

/// Profile update fields, collected from the multipart form alongside the
/// optional avatar file. Only email and phone may change this way.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateForm {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdateForm {
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(Error::BadRequest {
                    message: "Valid email is required".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub message: String,
    pub avatar_url: String,
}

/// Minimal structural email check: one `@`, non-empty local part, and a dot
/// in the domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
