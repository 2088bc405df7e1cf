//! Test utilities for integration testing (available with `test-utils` feature).

use crate::api::models::users::CurrentUser;
use crate::auth::{password, session};
use crate::config::{Config, UploadConfig};
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse};
use crate::uploads::DEFAULT_AVATAR;
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

/// The password every fixture user is created with.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    let app = crate::Application::with_pool(config, pool).await.expect("Failed to create application");

    app.into_test_server()
}

/// A config with a unique temp upload directory, so tests can assert on the
/// exact set of files their requests created.
pub fn create_test_config() -> Config {
    let upload_dir = std::env::temp_dir().join(format!("trailhead-test-uploads-{}", Uuid::new_v4().simple()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        uploads: UploadConfig {
            dir: upload_dir,
            max_file_size: 1024 * 1024, // 1 MiB keeps oversize tests cheap
        },
        ..Default::default()
    }
}

pub async fn create_test_user(pool: &PgPool, username: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);

    let user_create = UserCreateDBRequest {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: password::hash_string(TEST_PASSWORD).expect("Failed to hash test password"),
        phone: None,
        avatar: DEFAULT_AVATAR.to_string(),
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

/// Mint a bearer header for a fixture user.
pub fn auth_header(user: &UserDBResponse, config: &Config) -> (String, String) {
    let token = session::create_session_token(&CurrentUser::from(user.clone()), config).expect("Failed to create session token");

    ("Authorization".to_string(), format!("Bearer {token}"))
}
