mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, build_test_app, create_user, delete_auth, get, get_auth, multipart_auth,
    post_json, TEST_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_then_login(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/register",
        json!({"username": "hanako", "email": "hanako@example.com", "password": "curtain-call"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let registered = body_json(response).await;
    assert_eq!(registered["username"], "hanako");
    assert_eq!(registered["email"], "hanako@example.com");
    assert!(registered.get("password").is_none());

    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({"username": "hanako", "password": "curtain-call"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    assert_eq!(login["token_type"], "Bearer");
    assert_eq!(login["user"]["role"], "user");
    assert_eq!(login["expires_in"], 30 * 24 * 3600);

    let token = login["access_token"].as_str().unwrap();
    let response = get_auth(app, "/api/v1/auth/user", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["id"], registered["id"]);
    assert!(me["profile_image"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_duplicate_username(pool: PgPool) {
    create_user(&pool, "taro", "user").await;
    let app = build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({"username": "taro", "password": "another-pass"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(
        json["fields"]["username"][0],
        "A user with that username already exists."
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_short_password(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({"username": "jiro", "password": "abc"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["password"].is_array());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_with_wrong_password_is_unauthorized(pool: PgPool) {
    create_user(&pool, "saburo", "user").await;
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({"username": "saburo", "password": "not-the-password"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({"username": "saburo", "password": TEST_PASSWORD}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_current_user_requires_token(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(app.clone(), "/api/v1/auth/user").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/v1/auth/user", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_user_changes_username_and_image(pool: PgPool) {
    let user = create_user(&pool, "shiro", "user").await;
    let app = build_test_app(pool);

    let response = multipart_auth(
        app,
        Method::PATCH,
        "/api/v1/auth/user",
        &user.token,
        &[("username", "shiro2")],
        &[("profile_image", "me.png", b"\x89PNG fake")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["username"], "shiro2");
    let image = json["profile_image"].as_str().unwrap();
    assert!(image.starts_with("/media/profile_images/"));
    assert!(image.ends_with(".png"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_user_rejects_non_image(pool: PgPool) {
    let user = create_user(&pool, "goro", "user").await;
    let app = build_test_app(pool);

    let response = multipart_auth(
        app,
        Method::PATCH,
        "/api/v1/auth/user",
        &user.token,
        &[],
        &[("profile_image", "notes.txt", b"plain text")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["profile_image"].is_array());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_user(pool: PgPool) {
    let user = create_user(&pool, "rokuro", "user").await;
    let app = build_test_app(pool);

    let response = delete_auth(app.clone(), "/api/v1/auth/user", &user.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({"username": "rokuro", "password": TEST_PASSWORD}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
