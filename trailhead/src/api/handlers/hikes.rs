use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::hikes::{
        AdvancedSearchQuery, HikeCreate, HikeCreateResponse, HikeListResponse, HikeResponse, HikeUpdate, ListAllHikesQuery,
        SearchNameQuery,
    },
    api::models::{auth::MessageResponse, users::CurrentUser},
    db::handlers::{hikes::HikeFilter, Hikes, Repository},
    errors::{Error, Result},
    types::{HikeId, Operation},
    AppState,
};

/// List the authenticated user's hikes, newest first.
#[utoipa::path(
    get,
    path = "/api/hikes",
    tag = "hikes",
    responses(
        (status = 200, description = "The user's hikes", body = HikeListResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_user_hikes(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<HikeListResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hikes = repo.list(&HikeFilter::owned_by(current_user.id)).await?;

    Ok(Json(HikeListResponse::new(hikes)))
}

/// List every other user's hikes, optionally filtered by difficulty and
/// location, with offset pagination.
#[utoipa::path(
    get,
    path = "/api/hikes/all",
    tag = "hikes",
    params(ListAllHikesQuery),
    responses(
        (status = 200, description = "Other users' hikes", body = HikeListResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_all_hikes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListAllHikesQuery>,
) -> Result<Json<HikeListResponse>> {
    let mut filter = HikeFilter::excluding(current_user.id);
    if let Some(difficulty) = query.difficulty {
        filter = filter.with_difficulty(difficulty);
    }
    if let Some(location) = query.location {
        filter = filter.with_location(location);
    }
    if let Some(limit) = query.limit {
        filter = filter.paginate(limit, query.offset.unwrap_or(0));
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hikes = repo.list(&filter).await?;

    Ok(Json(HikeListResponse::new(hikes)))
}

/// Log a new hike.
#[utoipa::path(
    post,
    path = "/api/hikes",
    tag = "hikes",
    request_body = HikeCreate,
    responses(
        (status = 201, description = "Hike created", body = HikeCreateResponse),
        (status = 400, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_hike(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<HikeCreate>,
) -> Result<(StatusCode, Json<HikeCreateResponse>)> {
    let db_request = request.validate(current_user.id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let created = repo.create(&db_request).await?;

    Ok((
        StatusCode::CREATED,
        Json(HikeCreateResponse {
            message: "Hike created successfully".to_string(),
            hike_id: created.id,
            hike: HikeResponse::from(created),
        }),
    ))
}

/// Search the authenticated user's hikes by name.
#[utoipa::path(
    get,
    path = "/api/hikes/search/name",
    tag = "hikes",
    params(SearchNameQuery),
    responses(
        (status = 200, description = "Matching hikes", body = HikeListResponse),
        (status = 400, description = "Missing search query"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_hikes_by_name(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SearchNameQuery>,
) -> Result<Json<HikeListResponse>> {
    let name = require_search_query(query.name)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hikes = repo.list(&HikeFilter::owned_by(current_user.id).with_name(name).order_by_name()).await?;

    Ok(Json(HikeListResponse::new(hikes)))
}

/// Search the authenticated user's hikes by any combination of name,
/// location, length, and date.
#[utoipa::path(
    get,
    path = "/api/hikes/search/advanced",
    tag = "hikes",
    params(AdvancedSearchQuery),
    responses(
        (status = 200, description = "Matching hikes", body = HikeListResponse),
        (status = 400, description = "Invalid filter"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn advanced_search_hikes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AdvancedSearchQuery>,
) -> Result<Json<HikeListResponse>> {
    let mut filter = HikeFilter::owned_by(current_user.id);
    if let Some(name) = query.name {
        filter = filter.with_name(name);
    }
    if let Some(location) = query.location {
        filter = filter.with_location(location);
    }
    if let Some(length) = query.length {
        filter = filter.with_length(length);
    }
    if let Some(date) = query.date.as_deref() {
        filter = filter.with_date(crate::api::models::hikes::parse_date(date)?);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hikes = repo.list(&filter).await?;

    Ok(Json(HikeListResponse::new(hikes)))
}

/// Search every other user's hikes by name.
#[utoipa::path(
    get,
    path = "/api/hikes/search/all/name",
    tag = "hikes",
    params(SearchNameQuery),
    responses(
        (status = 200, description = "Matching hikes", body = HikeListResponse),
        (status = 400, description = "Missing search query"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_all_hikes_by_name(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SearchNameQuery>,
) -> Result<Json<HikeListResponse>> {
    let name = require_search_query(query.name)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hikes = repo.list(&HikeFilter::excluding(current_user.id).with_name(name)).await?;

    Ok(Json(HikeListResponse::new(hikes)))
}

/// Fetch a single hike. Any authenticated user may view any hike.
#[utoipa::path(
    get,
    path = "/api/hikes/{hike_id}",
    tag = "hikes",
    params(("hike_id" = i64, Path, description = "Hike ID")),
    responses(
        (status = 200, description = "The hike", body = HikeResponse),
        (status = 404, description = "Hike not found"),
    )
)]
#[tracing::instrument(skip_all, fields(hike_id))]
pub async fn get_hike(State(state): State<AppState>, _current_user: CurrentUser, Path(hike_id): Path<HikeId>) -> Result<Json<HikeResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hike = repo.get_by_id(hike_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Hike".to_string(),
        id: hike_id.to_string(),
    })?;

    Ok(Json(HikeResponse::from(hike)))
}

/// Update a hike. Only its owner may do so.
#[utoipa::path(
    put,
    path = "/api/hikes/{hike_id}",
    tag = "hikes",
    params(("hike_id" = i64, Path, description = "Hike ID")),
    request_body = HikeUpdate,
    responses(
        (status = 200, description = "Hike updated", body = MessageResponse),
        (status = 400, description = "Invalid input or nothing to update"),
        (status = 403, description = "Not the hike owner"),
        (status = 404, description = "Hike not found"),
    )
)]
#[tracing::instrument(skip_all, fields(hike_id))]
pub async fn update_hike(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(hike_id): Path<HikeId>,
    Json(request): Json<HikeUpdate>,
) -> Result<Json<MessageResponse>> {
    let db_request = request.validate()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hike = repo.get_by_id(hike_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Hike".to_string(),
        id: hike_id.to_string(),
    })?;

    if hike.user_id != current_user.id {
        return Err(Error::Forbidden {
            action: Operation::Update,
            resource: "hike".to_string(),
        });
    }

    if db_request.is_empty() {
        return Err(Error::BadRequest {
            message: "No fields to update".to_string(),
        });
    }

    repo.update(hike_id, &db_request).await?;

    Ok(Json(MessageResponse {
        message: "Hike updated successfully".to_string(),
    }))
}

/// Delete a hike and, via the schema's cascade, its observations. Only the
/// owner may do so.
#[utoipa::path(
    delete,
    path = "/api/hikes/{hike_id}",
    tag = "hikes",
    params(("hike_id" = i64, Path, description = "Hike ID")),
    responses(
        (status = 200, description = "Hike deleted", body = MessageResponse),
        (status = 403, description = "Not the hike owner"),
        (status = 404, description = "Hike not found"),
    )
)]
#[tracing::instrument(skip_all, fields(hike_id))]
pub async fn delete_hike(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(hike_id): Path<HikeId>,
) -> Result<Json<MessageResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hikes::new(&mut pool_conn);

    let hike = repo.get_by_id(hike_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Hike".to_string(),
        id: hike_id.to_string(),
    })?;

    if hike.user_id != current_user.id {
        return Err(Error::Forbidden {
            action: Operation::Delete,
            resource: "hike".to_string(),
        });
    }

    repo.delete(hike_id).await?;

    Ok(Json(MessageResponse {
        message: "Hike deleted successfully".to_string(),
    }))
}

fn require_search_query(name: Option<String>) -> Result<String> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(Error::BadRequest {
            message: "Search query is required".to_string(),
        }),
    }
}
