#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::FixedOffset;
use http_body_util::BodyExt;
use hoshidori_api::auth::jwt::{generate_access_token, JwtConfig};
use hoshidori_api::auth::password::hash_password;
use hoshidori_api::config::ServerConfig;
use hoshidori_api::router::build_app_router;
use hoshidori_api::state::AppState;
use hoshidori_core::types::DbId;
use hoshidori_db::models::user::CreateUser;
use hoshidori_db::repositories::{RoleRepo, UserRepo};
use sqlx::PgPool;
use tower::ServiceExt;

/// Password given to every user made by [`create_user`].
pub const TEST_PASSWORD: &str = "backstage-pass";

/// Build a test `ServerConfig` with safe defaults.
///
/// Local time is JST, uploads go to a fresh temp directory and the contact
/// form has a recipient but no mailer.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        media_dir: std::env::temp_dir().join(format!("hoshidori-test-{}", uuid::Uuid::new_v4())),
        local_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
        contact_recipient: Some("staff@hoshidori.test".to_string()),
        jwt: test_jwt(),
    }
}

pub fn test_jwt() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        access_token_expiry_days: 30,
    }
}

/// Build the full application router, with the same middleware stack as
/// production, over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: None,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user row plus a bearer token for it.
pub struct TestUser {
    pub id: DbId,
    pub token: String,
}

/// Insert a user with the given role (`"admin"` or `"user"`).
pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> TestUser {
    let role_row = RoleRepo::find_by_name(pool, role)
        .await
        .unwrap()
        .expect("role should be seeded");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role_id: role_row.id,
        },
    )
    .await
    .expect("user creation should succeed");

    let token = generate_access_token(user.id, role, &test_jwt()).unwrap();
    TestUser { id: user.id, token }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: Body,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

fn json_body(value: serde_json::Value) -> Body {
    Body::from(serde_json::to_vec(&value).unwrap())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, Body::empty()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some("application/json"), json_body(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some("application/json"), json_body(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some("application/json"), json_body(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None, Body::empty()).await
}

pub async fn post_csv_auth(app: Router, uri: &str, token: &str, csv: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some("text/csv"), Body::from(csv.to_string())).await
}

/// Send a multipart form. `files` are `(field, filename, bytes)`.
pub async fn multipart_auth(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Response<Body> {
    const BOUNDARY: &str = "hoshidori-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    send(app, method, uri, Some(token), Some(&content_type), Body::from(body)).await
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response body should be JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
