use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::handlers::text_field,
    api::models::{
        auth::{AuthResponse, AvatarResponse, ChangePasswordRequest, LoginRequest, MessageResponse, ProfileUpdateForm, RegisterForm},
        users::{CurrentUser, PublicUserResponse, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    uploads::{PendingUpload, DEFAULT_AVATAR},
    AppState,
};

/// Register a new user account, with an optional avatar upload.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "authentication",
    request_body(
        content_type = "multipart/form-data",
        description = "username, email, password, optional phone, optional avatar image"
    ),
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, mut multipart: Multipart) -> Result<(StatusCode, Json<AuthResponse>)> {
    let mut form = RegisterForm::default();
    let mut pending: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "avatar" => pending = Some(state.uploads.receive(field).await?),
            "username" => form.username = Some(text_field(field).await?),
            "email" => form.email = Some(text_field(field).await?),
            "password" => form.password = Some(text_field(field).await?),
            "phone" => form.phone = Some(text_field(field).await?),
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    // From here on any early return drops `pending`, which removes the
    // just-stored avatar file again.
    let (username, email, password, phone) = form.validate(&state.config.auth.password)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    if user_repo.identity_exists(&username, &email).await? {
        return Err(Error::BadRequest {
            message: "Username or email already exists".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let avatar = pending.as_ref().map(|p| p.url().to_string()).unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    // A concurrent registration with the same username or email loses here
    // with a unique violation; the file cleanup above covers that loser too.
    let created = user_repo
        .create(&UserCreateDBRequest {
            username,
            email,
            password_hash,
            phone,
            avatar,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // The row referencing the avatar is durable; disarm the cleanup guard.
    if let Some(pending) = pending {
        pending.commit();
    }

    let token = session::create_session_token(&CurrentUser::from(created.clone()), &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: UserResponse::from(created),
            token,
        }),
    ))
}

/// Login with email or username.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AuthResponse>> {
    let (identifier, password_input) = request.validate()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.find_for_login(&identifier).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid credentials".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password_input, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid credentials".to_string()),
        });
    }

    let token = session::create_session_token(&CurrentUser::from(user.clone()), &state.config)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: UserResponse::from(user),
        token,
    }))
}

/// Get the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "authentication",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: current_user.id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Look up another user's public profile by username.
#[utoipa::path(
    get,
    path = "/api/auth/users/{username}",
    tag = "authentication",
    params(("username" = String, Path, description = "Username to look up")),
    responses(
        (status = 200, description = "Public profile", body = PublicUserResponse),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user_by_username(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<PublicUserResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_username(&username).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: username.clone(),
    })?;

    Ok(Json(PublicUserResponse::from(user)))
}

/// Update the authenticated user's profile: email, phone, and avatar only.
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "authentication",
    request_body(
        content_type = "multipart/form-data",
        description = "Optional email, phone, and avatar image"
    ),
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 400, description = "Invalid input or nothing to update"),
        (status = 409, description = "Email already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>> {
    let mut form = ProfileUpdateForm::default();
    let mut pending: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "avatar" => pending = Some(state.uploads.receive(field).await?),
            "email" => form.email = Some(text_field(field).await?),
            "phone" => form.phone = Some(text_field(field).await?),
            _ => {}
        }
    }

    form.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(email) = &form.email {
        if user_repo.email_taken_by_other(email, current_user.id).await? {
            return Err(Error::BadRequest {
                message: "Email already taken".to_string(),
            });
        }
    }

    // Capture the current avatar reference before the write so the old file
    // can be reaped after the new one is committed.
    let current = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: current_user.id.to_string(),
    })?;

    let update = UserUpdateDBRequest {
        email: form.email,
        phone: form.phone,
        avatar: pending.as_ref().map(|p| p.url().to_string()),
        password_hash: None,
    };

    if update.is_empty() {
        return Err(Error::BadRequest {
            message: "No fields to update".to_string(),
        });
    }

    user_repo.update(current_user.id, &update).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Delete the superseded avatar only now that the new reference is
    // durable. A failure anywhere above leaves the old file serving.
    if let Some(pending) = pending {
        pending.commit();
        state.uploads.remove_stale(&current.avatar).await;
    }

    Ok(Json(MessageResponse {
        message: "Profile updated successfully".to_string(),
    }))
}

/// Change the authenticated user's password.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "authentication",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Current password is incorrect"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let (old_password, new_password) = request.validate(&state.config.auth.password)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: current_user.id.to_string(),
    })?;

    let hash = user.password_hash.clone();
    let old_matches = tokio::task::spawn_blocking(move || password::verify_string(&old_password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !old_matches {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    let new_hash = tokio::task::spawn_blocking(move || password::hash_string(&new_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    user_repo
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                password_hash: Some(new_hash),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Upload a new avatar for the authenticated user.
#[utoipa::path(
    post,
    path = "/api/auth/avatar",
    tag = "authentication",
    request_body(
        content_type = "multipart/form-data",
        description = "The avatar image"
    ),
    responses(
        (status = 200, description = "Avatar uploaded", body = AvatarResponse),
        (status = 400, description = "No file uploaded or file rejected"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>> {
    let mut pending: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() == Some("avatar") {
            pending = Some(state.uploads.receive(field).await?);
        }
    }

    let pending = pending.ok_or_else(|| Error::BadRequest {
        message: "No file uploaded".to_string(),
    })?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    // The guard on `pending` removes the file if the user vanished or the
    // update below fails.
    let current = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: current_user.id.to_string(),
    })?;

    user_repo
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                avatar: Some(pending.url().to_string()),
                ..Default::default()
            },
        )
        .await?;

    let avatar_url = pending.commit();
    state.uploads.remove_stale(&current.avatar).await;

    Ok(Json(AvatarResponse {
        message: "Avatar uploaded successfully".to_string(),
        avatar_url,
    }))
}
