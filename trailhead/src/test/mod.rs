//! End-to-end tests: the full router against a real database, exercising
//! the upload lifecycle guarantees alongside the plain CRUD flows.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::path::{Path, PathBuf};

use crate::test_utils::{auth_header, create_test_app, create_test_app_with_config, create_test_config, create_test_user, TEST_PASSWORD};

fn jpeg_part(bytes: Vec<u8>, name: &str) -> Part {
    Part::bytes(bytes).file_name(name.to_string()).mime_type("image/jpeg")
}

fn upload_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn file_for(dir: &Path, url: &str) -> PathBuf {
    dir.join(url.strip_prefix("/uploads/").expect("not an upload url"))
}

/// Register a user (optionally with an avatar) and return the response body.
async fn register(server: &TestServer, username: &str, avatar: Option<Part>) -> Value {
    let mut form = MultipartForm::new()
        .add_text("username", username.to_string())
        .add_text("email", format!("{username}@example.com"))
        .add_text("password", TEST_PASSWORD.to_string());
    if let Some(part) = avatar {
        form = form.add_part("avatar", part);
    }

    let response = server.post("/api/auth/register").multipart(form).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

fn token_of(body: &Value) -> String {
    body["token"].as_str().expect("token in response").to_string()
}

async fn create_hike(server: &TestServer, token: &str, name: &str) -> i64 {
    let response = server
        .post("/api/hikes")
        .add_header("authorization", format!("Bearer {token}"))
        .json(&json!({
            "name": name,
            "location": "Lake District",
            "hikeDate": "2024-06-12",
            "parkingAvailable": true,
            "length": 14.5,
            "difficultyLevel": "Moderate",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["hikeId"].as_i64().expect("hikeId")
}

#[sqlx::test]
#[test_log::test]
async fn test_health_and_unknown_route(pool: PgPool) {
    let server = create_test_app(pool).await;

    let response = server.get("/api/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "API is running");

    let response = server.get("/api/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Endpoint not found");
}

#[sqlx::test]
#[test_log::test]
async fn test_register_login_profile_flow(pool: PgPool) {
    let config = create_test_config();
    let server = create_test_app_with_config(pool, config).await;

    let registered = register(&server, "morgan", None).await;
    assert_eq!(registered["user"]["username"], "morgan");
    assert_eq!(registered["user"]["avatar"], "default_avatar.png");

    // Login by username
    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "morgan", "password": TEST_PASSWORD}))
        .await;
    response.assert_status_ok();
    let login = response.json::<Value>();
    assert_eq!(login["message"], "Login successful");

    // Profile with the issued token
    let response = server
        .get("/api/auth/profile")
        .add_header("authorization", format!("Bearer {}", token_of(&login)))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["email"], "morgan@example.com");

    // Bad password
    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "morgan", "password": "wrong-password"}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    // No token, no profile
    let response = server.get("/api/auth/profile").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
#[test_log::test]
async fn test_register_with_avatar_persists_and_references_file(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let registered = register(&server, "ida", Some(jpeg_part(b"fake-jpeg-bytes".to_vec(), "me.jpg"))).await;

    let avatar_url = registered["user"]["avatar"].as_str().expect("avatar url");
    assert!(avatar_url.starts_with("/uploads/"));
    assert!(file_for(&upload_dir, avatar_url).exists());

    // The stored file is served back over /uploads
    let response = server.get(avatar_url).await;
    response.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_duplicate_registration_deletes_uploaded_avatar(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    register(&server, "sam", None).await;
    assert_eq!(upload_count(&upload_dir), 0);

    // Same username again, this time with an avatar: the request must fail
    // and the avatar file must not survive it.
    let form = MultipartForm::new()
        .add_text("username", "sam")
        .add_text("email", "other@example.com")
        .add_text("password", TEST_PASSWORD)
        .add_part("avatar", jpeg_part(b"loser-avatar".to_vec(), "loser.jpg"));
    let response = server.post("/api/auth/register").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(upload_count(&upload_dir), 0);

    // Taken email under a fresh username fails the same way
    let form = MultipartForm::new()
        .add_text("username", "notsam")
        .add_text("email", "sam@example.com")
        .add_text("password", TEST_PASSWORD)
        .add_part("avatar", jpeg_part(b"loser-avatar".to_vec(), "loser.jpg"));
    let response = server.post("/api/auth/register").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(upload_count(&upload_dir), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_register_validation_failure_deletes_uploaded_avatar(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    // Password too short: domain validation fails after the file was stored
    let form = MultipartForm::new()
        .add_text("username", "casey")
        .add_text("email", "casey@example.com")
        .add_text("password", "short")
        .add_part("avatar", jpeg_part(b"avatar".to_vec(), "casey.jpg"));
    let response = server.post("/api/auth/register").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(upload_count(&upload_dir), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_oversized_upload_rejected_without_leaving_a_file(pool: PgPool) {
    // Test config caps uploads at 1 MiB; send 1.5 MiB
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let form = MultipartForm::new()
        .add_text("username", "bigfile")
        .add_text("email", "bigfile@example.com")
        .add_text("password", TEST_PASSWORD)
        .add_part("avatar", jpeg_part(vec![0u8; 1_500_000], "huge.jpg"));
    let response = server.post("/api/auth/register").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "File size exceeds maximum limit");
    assert_eq!(upload_count(&upload_dir), 0);

    // And no user row was created along the way
    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "bigfile", "password": TEST_PASSWORD}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
#[test_log::test]
async fn test_non_image_upload_rejected(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let form = MultipartForm::new()
        .add_text("username", "texty")
        .add_text("email", "texty@example.com")
        .add_text("password", TEST_PASSWORD)
        .add_part(
            "avatar",
            Part::bytes(b"#!/bin/sh".to_vec()).file_name("script.sh").mime_type("text/x-shellscript"),
        );
    let response = server.post("/api/auth/register").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Only image files are allowed (jpeg, jpg, png, gif, webp)"
    );
    assert_eq!(upload_count(&upload_dir), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_avatar_replacement_reaps_old_file_after_commit(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let registered = register(&server, "nadia", Some(jpeg_part(b"first".to_vec(), "first.jpg"))).await;
    let token = token_of(&registered);
    let first_url = registered["user"]["avatar"].as_str().unwrap().to_string();
    assert!(file_for(&upload_dir, &first_url).exists());

    let form = MultipartForm::new().add_part("avatar", jpeg_part(b"second".to_vec(), "second.jpg"));
    let response = server
        .post("/api/auth/avatar")
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status_ok();
    let second_url = response.json::<Value>()["avatarUrl"].as_str().unwrap().to_string();

    assert!(!file_for(&upload_dir, &first_url).exists(), "old avatar must be reaped");
    assert!(file_for(&upload_dir, &second_url).exists(), "new avatar must persist");

    let response = server
        .get("/api/auth/profile")
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.json::<Value>()["avatar"], second_url.as_str());
}

#[sqlx::test]
#[test_log::test]
async fn test_default_avatar_is_never_deleted(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    // User starts on the shared default; replacing it must not try to
    // delete the default asset, however many times it is "superseded".
    let registered = register(&server, "olive", None).await;
    let token = token_of(&registered);

    for round in 0u8..2 {
        let form = MultipartForm::new().add_part("avatar", jpeg_part(vec![round], "round.jpg"));
        let response = server
            .post("/api/auth/avatar")
            .add_header("authorization", format!("Bearer {token}"))
            .multipart(form)
            .await;
        response.assert_status_ok();
    }

    // Only the latest upload remains
    assert_eq!(upload_count(&upload_dir), 1);
}

#[sqlx::test]
#[test_log::test]
async fn test_profile_update_flow(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let registered = register(&server, "pat", Some(jpeg_part(b"original".to_vec(), "pat.jpg"))).await;
    let token = token_of(&registered);
    let original_url = registered["user"]["avatar"].as_str().unwrap().to_string();

    // Invalid email with a new avatar: rejected, new file cleaned up, old kept
    let form = MultipartForm::new()
        .add_text("email", "not-an-email")
        .add_part("avatar", jpeg_part(b"discarded".to_vec(), "discarded.jpg"));
    let response = server
        .put("/api/auth/profile")
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(file_for(&upload_dir, &original_url).exists());
    assert_eq!(upload_count(&upload_dir), 1);

    // Nothing to update
    let response = server
        .put("/api/auth/profile")
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(MultipartForm::new())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No fields to update");

    // Valid update with a replacement avatar reaps the original
    let form = MultipartForm::new()
        .add_text("phone", "555-0199")
        .add_part("avatar", jpeg_part(b"replacement".to_vec(), "new.jpg"));
    let response = server
        .put("/api/auth/profile")
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status_ok();
    assert!(!file_for(&upload_dir, &original_url).exists());
    assert_eq!(upload_count(&upload_dir), 1);

    let response = server
        .get("/api/auth/profile")
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    let profile = response.json::<Value>();
    assert_eq!(profile["phone"], "555-0199");
    assert!(profile["avatar"].as_str().unwrap().starts_with("/uploads/"));
}

#[sqlx::test]
#[test_log::test]
async fn test_change_password(pool: PgPool) {
    let config = create_test_config();
    let server = create_test_app_with_config(pool, config).await;

    let registered = register(&server, "quinn", None).await;
    let token = token_of(&registered);

    let response = server
        .post("/api/auth/change-password")
        .add_header("authorization", format!("Bearer {token}"))
        .json(&json!({
            "oldPassword": TEST_PASSWORD,
            "newPassword": "a-new-password-9",
            "confirmPassword": "a-new-password-9",
        }))
        .await;
    response.assert_status_ok();

    // Old password no longer works, new one does
    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "quinn", "password": TEST_PASSWORD}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "quinn", "password": "a-new-password-9"}))
        .await;
    response.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_hike_crud_and_search(pool: PgPool) {
    let config = create_test_config();
    let server = create_test_app_with_config(pool, config).await;

    let alice = register(&server, "alice", None).await;
    let bob = register(&server, "bob", None).await;
    let alice_token = token_of(&alice);
    let bob_token = token_of(&bob);

    let hike_id = create_hike(&server, &alice_token, "Scafell Pike").await;
    create_hike(&server, &bob_token, "Ben Nevis North Face").await;

    // Own listing
    let response = server
        .get("/api/hikes")
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["count"], 1);
    assert_eq!(body["hikes"][0]["username"], "alice");

    // /all excludes the caller's own hikes
    let response = server
        .get("/api/hikes/all")
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    let body = response.json::<Value>();
    assert_eq!(body["count"], 1);
    assert_eq!(body["hikes"][0]["name"], "Ben Nevis North Face");

    // Search own hikes by name
    let response = server
        .get("/api/hikes/search/name?name=scafell")
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    assert_eq!(response.json::<Value>()["count"], 1);

    // Search requires a query
    let response = server
        .get("/api/hikes/search/name")
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Search everyone else's hikes
    let response = server
        .get("/api/hikes/search/all/name?name=nevis")
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    assert_eq!(response.json::<Value>()["count"], 1);

    // Update, then verify
    let response = server
        .put(&format!("/api/hikes/{hike_id}"))
        .add_header("authorization", format!("Bearer {alice_token}"))
        .json(&json!({"difficultyLevel": "Expert", "length": 16.2}))
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/hikes/{hike_id}"))
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    let body = response.json::<Value>();
    assert_eq!(body["difficultyLevel"], "Expert");
    assert_eq!(body["length"], 16.2);

    // Invalid difficulty is rejected
    let response = server
        .put(&format!("/api/hikes/{hike_id}"))
        .add_header("authorization", format!("Bearer {alice_token}"))
        .json(&json!({"difficultyLevel": "Vertical"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Delete, then 404
    let response = server
        .delete(&format!("/api/hikes/{hike_id}"))
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/hikes/{hike_id}"))
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[sqlx::test]
#[test_log::test]
async fn test_hike_ownership_enforced(pool: PgPool) {
    let config = create_test_config();
    let server = create_test_app_with_config(pool, config).await;

    let alice = register(&server, "alice", None).await;
    let mallory = register(&server, "mallory", None).await;
    let hike_id = create_hike(&server, &token_of(&alice), "Striding Edge").await;
    let mallory_token = token_of(&mallory);

    let response = server
        .put(&format!("/api/hikes/{hike_id}"))
        .add_header("authorization", format!("Bearer {mallory_token}"))
        .json(&json!({"name": "Hijacked"}))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .delete(&format!("/api/hikes/{hike_id}"))
        .add_header("authorization", format!("Bearer {mallory_token}"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[sqlx::test]
#[test_log::test]
async fn test_observation_photo_lifecycle(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let alice = register(&server, "alice", None).await;
    let token = token_of(&alice);
    let hike_id = create_hike(&server, &token, "Crinkle Crags").await;

    // Create with photo A
    let form = MultipartForm::new()
        .add_text("observation", "Herdwick sheep on the col")
        .add_text("observationType", "Wildlife")
        .add_part("photo", jpeg_part(b"photo-a".to_vec(), "photoA.jpg"));
    let response = server
        .post(&format!("/api/hikes/{hike_id}/observations"))
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);
    let created = response.json::<Value>();
    let observation_id = created["observationId"].as_i64().unwrap();
    let photo_a = created["observation"]["photoUrl"].as_str().unwrap().to_string();
    assert!(file_for(&upload_dir, &photo_a).exists());

    // Replace with photo B: A reaped after the update commits
    let form = MultipartForm::new().add_part("photo", jpeg_part(b"photo-b".to_vec(), "photoB.jpg"));
    let response = server
        .put(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status_ok();

    assert!(!file_for(&upload_dir, &photo_a).exists(), "replaced photo must be reaped");

    let response = server
        .get(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    let photo_b = response.json::<Value>()["photoUrl"].as_str().unwrap().to_string();
    assert_ne!(photo_a, photo_b);
    assert!(file_for(&upload_dir, &photo_b).exists());

    // deletePhoto=true clears the column and removes the file
    let form = MultipartForm::new().add_text("deletePhoto", "true");
    let response = server
        .put(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status_ok();

    assert!(!file_for(&upload_dir, &photo_b).exists());
    assert_eq!(upload_count(&upload_dir), 0);

    let response = server
        .get(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    assert!(response.json::<Value>()["photoUrl"].is_null());

    // Listing for the hike still returns the (photo-less) observation
    let response = server
        .get(&format!("/api/hikes/{hike_id}/observations"))
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.json::<Value>()["count"], 1);

    // Delete the observation entirely
    let response = server
        .delete(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[sqlx::test]
#[test_log::test]
async fn test_observation_failure_paths_clean_up_photo(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let alice = register(&server, "alice", None).await;
    let token = token_of(&alice);

    // Nonexistent hike: 404 after the photo was received
    let form = MultipartForm::new()
        .add_text("observation", "Ghost hike")
        .add_part("photo", jpeg_part(b"orphan".to_vec(), "orphan.jpg"));
    let response = server
        .post("/api/hikes/99999/observations")
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(upload_count(&upload_dir), 0);

    // Validation failure: empty observation text with a photo attached
    let hike_id = create_hike(&server, &token, "Great Gable").await;
    let form = MultipartForm::new()
        .add_text("observation", "   ")
        .add_part("photo", jpeg_part(b"orphan".to_vec(), "orphan.jpg"));
    let response = server
        .post(&format!("/api/hikes/{hike_id}/observations"))
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(upload_count(&upload_dir), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_observation_ownership_and_forbidden_upload_cleanup(pool: PgPool) {
    let config = create_test_config();
    let upload_dir = config.uploads.dir.clone();
    let server = create_test_app_with_config(pool, config).await;

    let alice = register(&server, "alice", None).await;
    let mallory = register(&server, "mallory", None).await;
    let alice_token = token_of(&alice);
    let mallory_token = token_of(&mallory);

    let hike_id = create_hike(&server, &alice_token, "Haystacks").await;

    // Anyone may observe any hike, including non-owners
    let form = MultipartForm::new().add_text("observation", "Buzzard overhead");
    let response = server
        .post(&format!("/api/hikes/{hike_id}/observations"))
        .add_header("authorization", format!("Bearer {mallory_token}"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);
    let observation_id = response.json::<Value>()["observationId"].as_i64().unwrap();

    // But only the observation's creator may edit it, hike owner included.
    // The photo uploaded with the forbidden update must not linger.
    let form = MultipartForm::new()
        .add_text("observation", "Rewritten by the hike owner")
        .add_part("photo", jpeg_part(b"intruder".to_vec(), "intruder.jpg"));
    let response = server
        .put(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {alice_token}"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(upload_count(&upload_dir), 0);

    let response = server
        .delete(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {alice_token}"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // The creator can delete it
    let response = server
        .delete(&format!("/api/hikes/observations/{observation_id}"))
        .add_header("authorization", format!("Bearer {mallory_token}"))
        .await;
    response.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_my_observations_includes_hike_details(pool: PgPool) {
    let config = create_test_config();
    let server = create_test_app_with_config(pool, config).await;

    let alice = register(&server, "alice", None).await;
    let token = token_of(&alice);
    let hike_id = create_hike(&server, &token, "Cat Bells").await;

    let form = MultipartForm::new().add_text("observation", "Morning mist in the valley");
    server
        .post(&format!("/api/hikes/{hike_id}/observations"))
        .add_header("authorization", format!("Bearer {token}"))
        .multipart(form)
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get("/api/hikes/observations/mine")
        .add_header("authorization", format!("Bearer {token}"))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["count"], 1);
    assert_eq!(body["observations"][0]["hikeName"], "Cat Bells");
    assert_eq!(body["observations"][0]["hikeLocation"], "Lake District");
}

#[sqlx::test]
#[test_log::test]
async fn test_public_user_lookup(pool: PgPool) {
    let config = create_test_config();
    let server = create_test_app_with_config(pool.clone(), config.clone()).await;

    // Seed a user directly and mint a token for them
    let zoe = create_test_user(&pool, "zoe").await;
    let (header_name, header_value) = auth_header(&zoe, &config);

    let response = server.get("/api/auth/users/zoe").add_header(header_name.clone(), header_value.clone()).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["username"], "zoe");
    assert!(body.get("email").is_none(), "public profile must not expose the email");

    let response = server.get("/api/auth/users/nobody").add_header(header_name, header_value).await;
    response.assert_status(StatusCode::NOT_FOUND);
}
