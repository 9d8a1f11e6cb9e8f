//! Integration tests for the agentdesk views
//!
//! Tests cover:
//! - Listing view with empty and populated collections
//! - User/client creation (valid redirect, invalid re-render)
//! - Detail pages with nested formset editing (all-or-nothing apply)
//! - Delete confirmation and session gating, with cascade
//! - Registration (both forms as a pair, atomic persist, picture upload)
//! - Login/logout flows including disabled accounts
//! - Health endpoint

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower::util::ServiceExt; // for `oneshot` method

use agentdesk::{auth, build_router, db, AppState};

struct TestApp {
    app: Router,
    pool: SqlitePool,
    uploads: PathBuf,
    // Holds the database and uploads on disk for the test's lifetime
    _root: tempfile::TempDir,
}

async fn setup() -> TestApp {
    let root = tempfile::tempdir().expect("Should create temp dir");
    let db_path = root.path().join("agentdesk.db");
    let pool = db::init_database(&db_path)
        .await
        .expect("Should initialize database");
    let uploads = root.path().join("uploads");

    let state = AppState::new(pool.clone(), uploads.clone());
    TestApp {
        app: build_router(state),
        pool,
        uploads,
        _root: root,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form_with_cookie(uri: &str, body: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

fn location(response: &axum::http::Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Should have Location header")
        .to_str()
        .unwrap()
}

/// Insert a user directly and return its id
async fn seed_user(pool: &SqlitePool, username: &str, password: &str) -> i64 {
    let hash = auth::hash_password(password);
    db::users::insert_user(pool, username, "seed@example.com", &hash)
        .await
        .expect("Should insert user")
}

/// Establish a session for a user and return its Cookie header value
async fn seed_session(pool: &SqlitePool, user_id: i64) -> String {
    let token = db::sessions::create_session(pool, user_id)
        .await
        .expect("Should create session");
    format!("session={}", token)
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn health_endpoint() {
    let t = setup().await;

    let response = t.app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response.into_body()).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "agentdesk");
    assert!(json["version"].is_string());
}

// =============================================================================
// Listing view
// =============================================================================

#[tokio::test]
async fn listing_renders_empty_collections() {
    let t = setup().await;

    let response = t.app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response.into_body()).await;
    assert!(body.contains("No users yet."));
    assert!(body.contains("No clients yet."));
}

#[tokio::test]
async fn listing_shows_created_records() {
    let t = setup().await;
    seed_user(&t.pool, "alice", "secret123").await;
    db::clients::insert_client(&t.pool, "Acme Corp", Some("Acme"), None, None)
        .await
        .unwrap();

    let response = t.app.oneshot(get("/")).await.unwrap();
    let body = body_string(response.into_body()).await;
    assert!(body.contains("alice"));
    assert!(body.contains("Acme Corp"));
}

// =============================================================================
// Create views
// =============================================================================

#[tokio::test]
async fn create_user_valid_redirects_to_detail() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(post_form(
            "/user/new",
            "username=alice&password=secret123&email=a%40x.com",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/user/1");

    // The detail page shows the new user with zero properties
    let detail = t.app.oneshot(get("/user/1")).await.unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
    let body = body_string(detail.into_body()).await;
    assert!(body.contains("alice"));
    // Only the blank add-a-record slot
    assert!(body.contains("name=\"prop-total\" value=\"1\""));
}

#[tokio::test]
async fn create_user_stores_hashed_password() {
    let t = setup().await;

    t.app
        .oneshot(post_form(
            "/user/new",
            "username=alice&password=secret123&email=a%40x.com",
        ))
        .await
        .unwrap();

    let user = db::users::get_user(&t.pool, 1).await.unwrap().unwrap();
    assert_ne!(user.password, "secret123");
    assert!(auth::verify_password("secret123", &user.password));
}

#[tokio::test]
async fn create_user_invalid_preserves_input_and_writes_nothing() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_form(
            "/user/new",
            "username=alice&password=short&email=not-an-email",
        ))
        .await
        .unwrap();

    // Re-rendered with errors, not redirected
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("value=\"alice\""));
    assert!(body.contains("Email must be a valid email address."));
    assert!(body.contains("Password must be at least 8 characters."));

    let users = db::users::list_users(&t.pool).await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn create_client_valid_redirects_to_detail() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_form("/client/new", "name=Acme+Corp&company=Acme"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/client/1");

    let client = db::clients::get_client(&t.pool, 1).await.unwrap().unwrap();
    assert_eq!(client.name, "Acme Corp");
    assert_eq!(client.company.as_deref(), Some("Acme"));
}

// =============================================================================
// Detail + formset views
// =============================================================================

#[tokio::test]
async fn detail_missing_user_is_404() {
    let t = setup().await;

    let response = t.app.oneshot(get("/user/99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn property_bundle_applies_create_update_delete() {
    let t = setup().await;
    let user_id = seed_user(&t.pool, "alice", "secret123").await;

    // Create two properties through the bundle
    let response = t
        .app
        .clone()
        .oneshot(post_form(
            &format!("/user/{}", user_id),
            "prop-total=2&prop-0-address=1+Main+St&prop-0-city=Springfield&prop-0-price=250000\
             &prop-1-address=2+Oak+Ave",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/user/{}", user_id));

    let properties = db::users::list_properties(&t.pool, user_id).await.unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0].address, "1 Main St");
    assert_eq!(properties[0].price, Some(250000));

    // Update the first, delete the second, add a third, in one bundle
    let first = properties[0].id;
    let second = properties[1].id;
    let body = format!(
        "prop-total=3\
         &prop-0-id={first}&prop-0-address=1+Main+St+Rev&prop-0-price=260000\
         &prop-1-id={second}&prop-1-address=2+Oak+Ave&prop-1-delete=on\
         &prop-2-address=3+Elm+Rd",
    );
    let response = t
        .app
        .oneshot(post_form(&format!("/user/{}", user_id), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let properties = db::users::list_properties(&t.pool, user_id).await.unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0].address, "1 Main St Rev");
    assert_eq!(properties[0].price, Some(260000));
    assert_eq!(properties[1].address, "3 Elm Rd");
}

#[tokio::test]
async fn invalid_bundle_writes_nothing() {
    let t = setup().await;
    let user_id = seed_user(&t.pool, "alice", "secret123").await;

    // Second row has a non-numeric price; the valid first row must not land
    let response = t
        .app
        .oneshot(post_form(
            &format!("/user/{}", user_id),
            "prop-total=2&prop-0-address=1+Main+St&prop-1-address=2+Oak+Ave&prop-1-price=lots",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("Price must be a whole number."));
    // Prior input is preserved in the re-rendered bundle
    assert!(body.contains("value=\"1 Main St\""));
    // The blank add-a-record slot follows the submitted rows
    assert!(body.contains("name=\"prop-2-address\""));

    let properties = db::users::list_properties(&t.pool, user_id).await.unwrap();
    assert!(properties.is_empty());
}

#[tokio::test]
async fn inflated_row_count_rejected_with_bounded_response() {
    let t = setup().await;
    let user_id = seed_user(&t.pool, "alice", "secret123").await;

    let response = t
        .app
        .oneshot(post_form(
            &format!("/user/{}", user_id),
            "prop-total=100000000",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("At most 100 rows are allowed."));
    // The re-render is clamped, not proportional to the claimed row count
    assert!(body.len() < 200_000);

    let properties = db::users::list_properties(&t.pool, user_id).await.unwrap();
    assert!(properties.is_empty());
}

#[tokio::test]
async fn meeting_bundle_normalizes_datetime() {
    let t = setup().await;
    let client_id = db::clients::insert_client(&t.pool, "Acme Corp", None, None, None)
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(post_form(
            &format!("/client/{}", client_id),
            "mtg-total=1&mtg-0-subject=Kickoff&mtg-0-scheduled_at=2026-09-01T10%3A00",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let meetings = db::clients::list_meetings(&t.pool, client_id).await.unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0].subject, "Kickoff");
    assert_eq!(meetings[0].scheduled_at.as_deref(), Some("2026-09-01 10:00"));
}

// =============================================================================
// Delete views
// =============================================================================

#[tokio::test]
async fn delete_without_body_leaves_record_present() {
    let t = setup().await;
    let client_id = db::clients::insert_client(&t.pool, "Acme Corp", None, None, None)
        .await
        .unwrap();

    // No form body at all
    let request = Request::builder()
        .method("POST")
        .uri(format!("/client/{}/delete", client_id))
        .body(Body::empty())
        .unwrap();
    let response = t.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    assert!(db::clients::get_client(&t.pool, client_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn delete_without_session_leaves_record_present() {
    let t = setup().await;
    let client_id = db::clients::insert_client(&t.pool, "Acme Corp", None, None, None)
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(post_form(
            &format!("/client/{}/delete", client_id),
            "confirm=delete",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(db::clients::get_client(&t.pool, client_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn delete_missing_entity_is_404() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_form("/client/99/delete", "confirm=delete"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn confirmed_delete_cascades_to_owned_rows() {
    let t = setup().await;
    let admin = seed_user(&t.pool, "admin", "secret123").await;
    let cookie = seed_session(&t.pool, admin).await;

    let target = seed_user(&t.pool, "bob", "secret123").await;
    sqlx::query("INSERT INTO properties (user_id, address, city, price) VALUES (?, ?, NULL, NULL)")
        .bind(target)
        .bind("1 Main St")
        .execute(&t.pool)
        .await
        .unwrap();
    assert_eq!(
        db::users::list_properties(&t.pool, target).await.unwrap().len(),
        1
    );

    let response = t
        .app
        .oneshot(post_form_with_cookie(
            &format!("/user/{}/delete", target),
            "confirm=delete",
            &cookie,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    assert!(db::users::get_user(&t.pool, target).await.unwrap().is_none());
    assert!(db::users::list_properties(&t.pool, target)
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Login / logout
// =============================================================================

#[tokio::test]
async fn login_success_sets_cookie_then_logout_terminates_session() {
    let t = setup().await;
    seed_user(&t.pool, "alice", "secret123").await;

    let response = t
        .app
        .clone()
        .oneshot(post_form("/login", "username=alice&password=secret123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Should set session cookie")
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let token = cookie.strip_prefix("session=").unwrap().to_string();
    assert!(db::sessions::find_user_by_token(&t.pool, &token)
        .await
        .unwrap()
        .is_some());

    let response = t
        .app
        .oneshot(get_with_cookie("/logout", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    assert!(db::sessions::find_user_by_token(&t.pool, &token)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn login_wrong_password_is_plain_text() {
    let t = setup().await;
    seed_user(&t.pool, "alice", "secret123").await;

    let response = t
        .app
        .oneshot(post_form("/login", "username=alice&password=wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert_eq!(body, "Invalid login details supplied.");

    // No session was established
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn login_inactive_account_never_establishes_session() {
    let t = setup().await;
    let id = seed_user(&t.pool, "alice", "secret123").await;
    sqlx::query("UPDATE users SET active = 0 WHERE id = ?")
        .bind(id)
        .execute(&t.pool)
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(post_form("/login", "username=alice&password=secret123"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert_eq!(body, "Your account is disabled.");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn logout_without_session_redirects_to_login() {
    let t = setup().await;

    let response = t.app.oneshot(get("/logout")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login");
}

// =============================================================================
// Registration
// =============================================================================

fn multipart_request(uri: &str, fields: &[(&str, &str)], picture: Option<(&str, &[u8])>) -> Request<Body> {
    let boundary = "agentdesk-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = picture {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"picture\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn register_valid_creates_user_profile_and_picture() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(multipart_request(
            "/register",
            &[
                ("username", "alice"),
                ("email", "a@x.com"),
                ("password", "secret123"),
                ("website", "https://example.com"),
            ],
            Some(("avatar.png", b"not-really-a-png")),
        ))
        .await
        .unwrap();

    // Success re-renders the same page, no redirect
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("Registration successful"));

    let user = db::users::find_by_username(&t.pool, "alice")
        .await
        .unwrap()
        .expect("User should exist");
    assert!(auth::verify_password("secret123", &user.password));

    let profile = db::profiles::get_profile_for_user(&t.pool, user.id)
        .await
        .unwrap()
        .expect("Profile should exist");
    assert_eq!(profile.website.as_deref(), Some("https://example.com"));

    let picture = profile.picture.expect("Picture should be recorded");
    let stored = std::fs::read(t.uploads.join(&picture)).expect("Picture file should exist");
    assert_eq!(stored, b"not-really-a-png");
}

#[tokio::test]
async fn register_without_picture_is_fine() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(multipart_request(
            "/register",
            &[
                ("username", "bob"),
                ("email", "b@x.com"),
                ("password", "secret123"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = db::users::find_by_username(&t.pool, "bob")
        .await
        .unwrap()
        .expect("User should exist");
    let profile = db::profiles::get_profile_for_user(&t.pool, user.id)
        .await
        .unwrap()
        .expect("Profile should exist");
    assert!(profile.picture.is_none());
}

#[tokio::test]
async fn register_invalid_shows_both_error_sets_and_writes_nothing() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(multipart_request(
            "/register",
            &[
                ("username", "alice"),
                ("email", "bogus"),
                ("password", "short"),
            ],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("Email must be a valid email address."));
    assert!(body.contains("Password must be at least 8 characters."));
    assert!(body.contains("value=\"alice\""));

    assert!(db::users::list_users(&t.pool).await.unwrap().is_empty());
    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_profiles")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(profiles, 0);
}
