use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::handlers::text_field,
    api::models::{
        auth::MessageResponse,
        observations::{
            ObservationCreateForm, ObservationCreateResponse, ObservationListResponse, ObservationResponse, ObservationUpdateForm,
        },
        users::CurrentUser,
    },
    db::{
        handlers::{observations::ObservationFilter, Hikes, Observations, Repository},
        models::observations::PhotoUpdate,
    },
    errors::{Error, Result},
    types::{HikeId, ObservationId, Operation},
    uploads::PendingUpload,
    AppState,
};

/// Record an observation on a hike, with an optional photo. Any
/// authenticated user may observe any hike.
#[utoipa::path(
    post,
    path = "/api/hikes/{hike_id}/observations",
    tag = "observations",
    params(("hike_id" = i64, Path, description = "Hike ID")),
    request_body(
        content_type = "multipart/form-data",
        description = "observation text, optional time/type/comments/coordinates, optional photo"
    ),
    responses(
        (status = 201, description = "Observation created", body = ObservationCreateResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Hike not found"),
    )
)]
#[tracing::instrument(skip_all, fields(hike_id))]
pub async fn create_observation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(hike_id): Path<HikeId>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ObservationCreateResponse>)> {
    let mut form = ObservationCreateForm::default();
    let mut pending: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "photo" => pending = Some(state.uploads.receive(field).await?),
            "observation" => form.observation = Some(text_field(field).await?),
            "observationTime" => form.observation_time = Some(text_field(field).await?),
            "comments" => form.comments = Some(text_field(field).await?),
            "observationType" => form.observation_type = Some(text_field(field).await?),
            "latitude" => form.latitude = Some(text_field(field).await?),
            "longitude" => form.longitude = Some(text_field(field).await?),
            _ => {}
        }
    }

    // Any early return below drops `pending`, removing the stored photo.
    let db_request = form.validate(hike_id, current_user.id, pending.as_ref().map(|p| p.url().to_string()))?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut hikes = Hikes::new(&mut pool_conn);
    if !hikes.exists(hike_id).await? {
        return Err(Error::NotFound {
            resource: "Hike".to_string(),
            id: hike_id.to_string(),
        });
    }

    let mut repo = Observations::new(&mut pool_conn);
    let created = repo.create(&db_request).await?;

    // The insert referencing the photo is durable; disarm the cleanup guard.
    if let Some(pending) = pending {
        pending.commit();
    }

    Ok((
        StatusCode::CREATED,
        Json(ObservationCreateResponse {
            message: "Observation created successfully".to_string(),
            observation_id: created.id,
            observation: ObservationResponse::from(created).without_hike_details(),
        }),
    ))
}

/// List all observations recorded on a hike, newest first.
#[utoipa::path(
    get,
    path = "/api/hikes/{hike_id}/observations",
    tag = "observations",
    params(("hike_id" = i64, Path, description = "Hike ID")),
    responses(
        (status = 200, description = "Observations for the hike", body = ObservationListResponse),
        (status = 404, description = "Hike not found"),
    )
)]
#[tracing::instrument(skip_all, fields(hike_id))]
pub async fn list_hike_observations(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(hike_id): Path<HikeId>,
) -> Result<Json<ObservationListResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut hikes = Hikes::new(&mut pool_conn);
    if !hikes.exists(hike_id).await? {
        return Err(Error::NotFound {
            resource: "Hike".to_string(),
            id: hike_id.to_string(),
        });
    }

    let mut repo = Observations::new(&mut pool_conn);
    let observations = repo.list(&ObservationFilter::for_hike(hike_id)).await?;

    let observations: Vec<ObservationResponse> = observations
        .into_iter()
        .map(|o| ObservationResponse::from(o).without_hike_details())
        .collect();

    Ok(Json(ObservationListResponse {
        count: observations.len(),
        observations,
    }))
}

/// List the authenticated user's observations across all hikes.
#[utoipa::path(
    get,
    path = "/api/hikes/observations/mine",
    tag = "observations",
    responses(
        (status = 200, description = "The user's observations", body = ObservationListResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_my_observations(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ObservationListResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Observations::new(&mut pool_conn);

    let observations = repo.list(&ObservationFilter::for_user(current_user.id)).await?;
    let observations: Vec<ObservationResponse> = observations.into_iter().map(ObservationResponse::from).collect();

    Ok(Json(ObservationListResponse {
        count: observations.len(),
        observations,
    }))
}

/// Fetch a single observation.
#[utoipa::path(
    get,
    path = "/api/hikes/observations/{observation_id}",
    tag = "observations",
    params(("observation_id" = i64, Path, description = "Observation ID")),
    responses(
        (status = 200, description = "The observation", body = ObservationResponse),
        (status = 404, description = "Observation not found"),
    )
)]
#[tracing::instrument(skip_all, fields(observation_id))]
pub async fn get_observation(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(observation_id): Path<ObservationId>,
) -> Result<Json<ObservationResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Observations::new(&mut pool_conn);

    let observation = repo.get_by_id(observation_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Observation".to_string(),
        id: observation_id.to_string(),
    })?;

    Ok(Json(ObservationResponse::from(observation).without_hike_details()))
}

/// Update an observation. Only its creator may do so, not the hike owner.
///
/// The photo column can change two ways: `deletePhoto=true` clears it, or a
/// fresh `photo` part replaces it. Either way the superseded file is
/// removed only after the row update has committed.
#[utoipa::path(
    put,
    path = "/api/hikes/observations/{observation_id}",
    tag = "observations",
    params(("observation_id" = i64, Path, description = "Observation ID")),
    request_body(
        content_type = "multipart/form-data",
        description = "Fields to update, an optional replacement photo, or deletePhoto=true"
    ),
    responses(
        (status = 200, description = "Observation updated", body = MessageResponse),
        (status = 400, description = "Invalid input or nothing to update"),
        (status = 403, description = "Not the observation creator"),
        (status = 404, description = "Observation not found"),
    )
)]
#[tracing::instrument(skip_all, fields(observation_id))]
pub async fn update_observation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(observation_id): Path<ObservationId>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>> {
    let mut form = ObservationUpdateForm::default();
    let mut pending: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "photo" => pending = Some(state.uploads.receive(field).await?),
            "observation" => form.observation = Some(text_field(field).await?),
            "observationTime" => form.observation_time = Some(text_field(field).await?),
            "comments" => form.comments = Some(text_field(field).await?),
            "observationType" => form.observation_type = Some(text_field(field).await?),
            "latitude" => form.latitude = Some(text_field(field).await?),
            "longitude" => form.longitude = Some(text_field(field).await?),
            "deletePhoto" => form.delete_photo = text_field(field).await? == "true",
            _ => {}
        }
    }

    let delete_photo = form.delete_photo;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Observations::new(&mut pool_conn);

    // Ownership check before any write; the guard on `pending` cleans up the
    // uploaded file on this and every other failure path.
    let existing = repo.get_by_id(observation_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Observation".to_string(),
        id: observation_id.to_string(),
    })?;

    if existing.user_id != current_user.id {
        return Err(Error::Forbidden {
            action: Operation::Update,
            resource: "observation".to_string(),
        });
    }

    let mut db_request = form.validate()?;

    // Decide the photo transition and remember the reference to reap. When
    // deletePhoto wins, a photo uploaded alongside it is never referenced;
    // its guard removes it below.
    let mut reap: Option<String> = None;
    let new_photo = if delete_photo { None } else { pending.take() };
    if delete_photo {
        db_request.photo = PhotoUpdate::Clear;
        reap = existing.photo_url.clone();
    } else if let Some(photo) = &new_photo {
        db_request.photo = PhotoUpdate::Set(photo.url().to_string());
        reap = existing.photo_url.clone();
    }

    if db_request.is_empty() {
        return Err(Error::BadRequest {
            message: "No fields to update".to_string(),
        });
    }

    repo.update(observation_id, &db_request).await?;

    if let Some(photo) = new_photo {
        photo.commit();
    }
    drop(pending);

    // Old photo goes only after the new reference is durable.
    if let Some(old) = reap {
        state.uploads.remove_stale(&old).await;
    }

    Ok(Json(MessageResponse {
        message: "Observation updated successfully".to_string(),
    }))
}

/// Delete an observation and its photo file. Only its creator may do so.
#[utoipa::path(
    delete,
    path = "/api/hikes/observations/{observation_id}",
    tag = "observations",
    params(("observation_id" = i64, Path, description = "Observation ID")),
    responses(
        (status = 200, description = "Observation deleted", body = MessageResponse),
        (status = 403, description = "Not the observation creator"),
        (status = 404, description = "Observation not found"),
    )
)]
#[tracing::instrument(skip_all, fields(observation_id))]
pub async fn delete_observation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(observation_id): Path<ObservationId>,
) -> Result<Json<MessageResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Observations::new(&mut pool_conn);

    let existing = repo.get_by_id(observation_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Observation".to_string(),
        id: observation_id.to_string(),
    })?;

    if existing.user_id != current_user.id {
        return Err(Error::Forbidden {
            action: Operation::Delete,
            resource: "observation".to_string(),
        });
    }

    repo.delete(observation_id).await?;

    // The row is gone; its photo is an orphan now. Defaults are skipped and
    // a missing file is a no-op, as everywhere else.
    if let Some(photo) = &existing.photo_url {
        state.uploads.remove_stale(photo).await;
    }

    Ok(Json(MessageResponse {
        message: "Observation deleted successfully".to_string(),
    }))
}
