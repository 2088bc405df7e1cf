//! OpenAPI document for the API, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::api::models::{auth, hikes, observations, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trailhead API",
        description = "A hiking-log REST API: users, hikes, and trail observations with photo uploads."
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::get_profile,
        crate::api::handlers::auth::update_profile,
        crate::api::handlers::auth::change_password,
        crate::api::handlers::auth::upload_avatar,
        crate::api::handlers::auth::get_user_by_username,
        crate::api::handlers::hikes::list_user_hikes,
        crate::api::handlers::hikes::list_all_hikes,
        crate::api::handlers::hikes::create_hike,
        crate::api::handlers::hikes::search_hikes_by_name,
        crate::api::handlers::hikes::advanced_search_hikes,
        crate::api::handlers::hikes::search_all_hikes_by_name,
        crate::api::handlers::hikes::get_hike,
        crate::api::handlers::hikes::update_hike,
        crate::api::handlers::hikes::delete_hike,
        crate::api::handlers::observations::create_observation,
        crate::api::handlers::observations::list_hike_observations,
        crate::api::handlers::observations::get_my_observations,
        crate::api::handlers::observations::get_observation,
        crate::api::handlers::observations::update_observation,
        crate::api::handlers::observations::delete_observation,
    ),
    components(schemas(
        auth::AuthResponse,
        auth::AvatarResponse,
        auth::ChangePasswordRequest,
        auth::LoginRequest,
        auth::MessageResponse,
        users::CurrentUser,
        users::PublicUserResponse,
        users::UserResponse,
        hikes::Difficulty,
        hikes::HikeCreate,
        hikes::HikeCreateResponse,
        hikes::HikeListResponse,
        hikes::HikeResponse,
        hikes::HikeUpdate,
        observations::ObservationCreateResponse,
        observations::ObservationListResponse,
        observations::ObservationResponse,
        observations::ObservationType,
    )),
    tags(
        (name = "authentication", description = "Registration, login, and profile management"),
        (name = "hikes", description = "Hike logging and search"),
        (name = "observations", description = "Trail observations attached to hikes"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
