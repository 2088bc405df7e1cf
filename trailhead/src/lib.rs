//! # trailhead: a hiking-log REST API
//!
//! `trailhead` is the backend for a hiking-log application: users register
//! and authenticate, log hikes, and attach observations (optionally with
//! photos) to any hike. It exposes a JSON REST API with multipart endpoints
//! for avatar and photo uploads.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via SQLx) for persistence. Uploaded
//! files live on the local filesystem under a configurable directory and are
//! served back at `/uploads/<name>`; rows reference them by that URL.
//!
//! ### Request Flow
//!
//! Requests hit the router built in [`build_router`]. Protected handlers
//! authenticate the caller by extracting a
//! [`CurrentUser`](api::models::users::CurrentUser) from the JWT bearer
//! token. Handlers validate input, talk to the database through the
//! repositories in [`db::handlers`], and map failures onto the service
//! error type in [`errors`].
//!
//! ### The upload lifecycle
//!
//! Endpoints that accept files follow one discipline, implemented in
//! [`uploads`]: the file is validated and written to disk first, wrapped in
//! a [`uploads::PendingUpload`] guard that deletes it again unless the
//! database write referencing it commits, at which point the guard is
//! disarmed and any superseded file is reaped. Shared default assets are
//! never deleted. This keeps the upload directory free of orphans no matter
//! which validation or database failure interrupts a request.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use trailhead::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = trailhead::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     trailhead::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;
pub mod uploads;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod test;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    http,
    routing::{get, post},
    Json, Router,
};
use bon::Builder;
pub use config::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use uploads::UploadStore;

/// Application state shared across all request handlers.
///
/// Opened once at startup and injected into every handler; nothing in the
/// crate reaches for ambient globals.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: application configuration loaded from file/environment
/// - `uploads`: handle to the upload directory
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub uploads: UploadStore,
}

/// Get the trailhead database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the database with the configured pool settings and run
/// migrations.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool_settings = &config.database.pool;

    let mut options = PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(Duration::from_secs(pool_settings.acquire_timeout_secs));

    if pool_settings.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(pool_settings.idle_timeout_secs));
    }
    if pool_settings.max_lifetime_secs > 0 {
        options = options.max_lifetime(Duration::from_secs(pool_settings.max_lifetime_secs));
    }

    let pool = options.connect(&config.database.url).await?;
    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.cors;

    let mut layer = if cors.allowed_origins.iter().any(|origin| origin == "*") {
        // Wildcard origins cannot be combined with credentials
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origins = cors
            .allowed_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(cors.allow_credentials)
            .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
            .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
    };

    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(Duration::from_secs(max_age));
    }

    Ok(layer)
}

/// Build the application router with all endpoints and middleware.
///
/// This wires up:
/// - Authentication routes (register, login, profile, avatar)
/// - Hike CRUD and search routes
/// - Observation routes nested under hikes
/// - Static serving of the upload directory at `/uploads`
/// - The OpenAPI document at `/api-docs/openapi.json`
/// - CORS and tracing middleware, and a JSON 404 fallback
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Upload endpoints get a body limit sized to the configured maximum,
    // plus slack for the other multipart fields.
    let upload_limit = state.config.uploads.max_file_size as usize + 1024 * 1024;

    let auth_routes = Router::new()
        .route(
            "/api/auth/register",
            post(api::handlers::auth::register).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/auth/login", post(api::handlers::auth::login))
        .route(
            "/api/auth/profile",
            get(api::handlers::auth::get_profile)
                .put(api::handlers::auth::update_profile)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/auth/change-password", post(api::handlers::auth::change_password))
        .route(
            "/api/auth/avatar",
            post(api::handlers::auth::upload_avatar).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/auth/users/{username}", get(api::handlers::auth::get_user_by_username));

    let hike_routes = Router::new()
        .route("/api/hikes", get(api::handlers::hikes::list_user_hikes).post(api::handlers::hikes::create_hike))
        .route("/api/hikes/all", get(api::handlers::hikes::list_all_hikes))
        .route("/api/hikes/search/name", get(api::handlers::hikes::search_hikes_by_name))
        .route("/api/hikes/search/advanced", get(api::handlers::hikes::advanced_search_hikes))
        .route("/api/hikes/search/all/name", get(api::handlers::hikes::search_all_hikes_by_name))
        .route(
            "/api/hikes/{hike_id}",
            get(api::handlers::hikes::get_hike)
                .put(api::handlers::hikes::update_hike)
                .delete(api::handlers::hikes::delete_hike),
        );

    let observation_routes = Router::new()
        .route(
            "/api/hikes/{hike_id}/observations",
            get(api::handlers::observations::list_hike_observations)
                .post(api::handlers::observations::create_observation)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/hikes/observations/mine", get(api::handlers::observations::get_my_observations))
        .route(
            "/api/hikes/observations/{observation_id}",
            get(api::handlers::observations::get_observation)
                .put(api::handlers::observations::update_observation)
                .delete(api::handlers::observations::delete_observation)
                .layer(DefaultBodyLimit::max(upload_limit)),
        );

    let router = Router::new()
        .route("/api/health", get(api::handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(<openapi::ApiDoc as utoipa::OpenApi>::openapi()) }),
        )
        .merge(auth_routes)
        .merge(hike_routes)
        .merge(observation_routes)
        // Byte retrieval for stored assets is plain static serving
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .fallback(|| async {
            (
                http::StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Endpoint not found" })),
            )
        })
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and prepares the upload directory and router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
/// 3. **Shutdown**: database connections are closed before returning
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        tracing::debug!("Starting trailhead with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::with_pool(config, pool).await
    }

    /// Build the application on an existing pool.
    ///
    /// Used by tests, where the pool arrives pre-migrated from the test
    /// harness; [`Application::new`] delegates here after connecting.
    pub async fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let uploads = UploadStore::init(config.uploads.dir.clone(), config.uploads.max_file_size).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).uploads(uploads).build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Trailhead API listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
