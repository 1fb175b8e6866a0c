mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_user, delete_auth, get, get_auth, patch_json_auth,
    post_json_auth, TestUser,
};
use hoshidori_db::repositories::TagRepo;
use serde_json::json;
use sqlx::PgPool;

async fn submit_work(app: &axum::Router, user: &TestUser, title: &str) -> i64 {
    let response =
        post_json_auth(app.clone(), "/api/v1/works", &user.token, json!({"title": title})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

async fn log_viewing(app: &axum::Router, user: &TestUser, work_id: i64, watched_at: &str) -> i64 {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/logs",
        &user.token,
        json!({"work_id": work_id, "watched_at": watched_at, "seat": "A-12"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logs_require_auth(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(app, "/api/v1/logs").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_log_expands_work(pool: PgPool) {
    let user = create_user(&pool, "viewer", "user").await;
    let mut conn = pool.acquire().await.unwrap();
    TagRepo::create_or_get(&mut conn, "moving").await.unwrap();
    drop(conn);
    let app = build_test_app(pool);
    let work_id = submit_work(&app, &user, "Evening Show").await;

    let response = post_json_auth(
        app,
        "/api/v1/logs",
        &user.token,
        json!({
            "work_id": work_id,
            "watched_at": "2025-03-01T09:30:00Z",
            "memo": "Great second act.",
            "rating": 4.5,
            "tags": ["moving"]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["user"], user.id);
    assert_eq!(json["work"]["id"], work_id);
    assert_eq!(json["work"]["title"], "Evening Show");
    assert_eq!(json["rating"], 4.5);
    assert_eq!(json["tags"], json!(["moving"]));
    assert!(json["watchedDate"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_log_requires_work_id(pool: PgPool) {
    let user = create_user(&pool, "viewer", "user").await;
    let app = build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/logs",
        &user.token,
        json!({"watched_at": "2025-03-01T09:30:00Z"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["fields"]["work_id"][0], "This field is required.");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_log_rejects_out_of_range_rating(pool: PgPool) {
    let user = create_user(&pool, "viewer", "user").await;
    let app = build_test_app(pool);
    let work_id = submit_work(&app, &user, "Harsh Critic").await;

    let response = post_json_auth(
        app,
        "/api/v1/logs",
        &user.token,
        json!({"work_id": work_id, "watched_at": "2025-03-01T09:30:00Z", "rating": 0.5}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["fields"]["rating"].is_array());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_log_rejects_hidden_work(pool: PgPool) {
    let author = create_user(&pool, "author", "user").await;
    let viewer = create_user(&pool, "viewer", "user").await;
    let admin = create_user(&pool, "boss", "admin").await;
    let app = build_test_app(pool);

    let work_id = submit_work(&app, &author, "Secret Draft").await;
    patch_json_auth(
        app.clone(),
        &format!("/api/v1/works/{work_id}"),
        &admin.token,
        json!({"status": "DRAFT"}),
    )
    .await;

    let response = post_json_auth(
        app,
        "/api/v1/logs",
        &viewer.token,
        json!({"work_id": work_id, "watched_at": "2025-03-01T09:30:00Z"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["fields"]["work_id"].is_array());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logs_are_scoped_to_owner(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let bob = create_user(&pool, "bob", "user").await;
    let app = build_test_app(pool);
    let work_id = submit_work(&app, &alice, "Shared Show").await;

    let alice_log = log_viewing(&app, &alice, work_id, "2025-03-01T09:30:00Z").await;
    log_viewing(&app, &bob, work_id, "2025-03-02T09:30:00Z").await;

    let json = body_json(get_auth(app.clone(), "/api/v1/logs", &alice.token).await).await;
    let logs = json.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["id"], alice_log);

    let uri = format!("/api/v1/logs/{alice_log}");
    assert_eq!(
        get_auth(app.clone(), &uri, &bob.token).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        patch_json_auth(app.clone(), &uri, &bob.token, json!({"memo": "mine"}))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        delete_auth(app, &uri, &bob.token).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_and_delete_own_log(pool: PgPool) {
    let user = create_user(&pool, "viewer", "user").await;
    let app = build_test_app(pool);
    let work_id = submit_work(&app, &user, "Revisited").await;
    let log_id = log_viewing(&app, &user, work_id, "2025-03-01T09:30:00Z").await;
    let uri = format!("/api/v1/logs/{log_id}");

    let response = patch_json_auth(
        app.clone(),
        &uri,
        &user.token,
        json!({"memo": "Better the second time.", "rating": 5.0}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["memo"], "Better the second time.");
    assert_eq!(json["rating"], 5.0);
    assert_eq!(json["seat"], "A-12");

    let response = delete_auth(app.clone(), &uri, &user.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        get_auth(app, &uri, &user.token).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_null_clears_rating(pool: PgPool) {
    let user = create_user(&pool, "viewer", "user").await;
    let app = build_test_app(pool);
    let work_id = submit_work(&app, &user, "Undecided").await;
    let log_id = log_viewing(&app, &user, work_id, "2025-03-01T09:30:00Z").await;
    let uri = format!("/api/v1/logs/{log_id}");

    let response = patch_json_auth(app.clone(), &uri, &user.token, json!({"rating": 4.0})).await;
    assert_eq!(body_json(response).await["rating"], 4.0);

    let response = patch_json_auth(app.clone(), &uri, &user.token, json!({"seat": "B-3"})).await;
    assert_eq!(body_json(response).await["rating"], 4.0);

    let response = patch_json_auth(app, &uri, &user.token, json!({"rating": null})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["rating"].is_null());
    assert_eq!(json["seat"], "B-3");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_changing_work_drops_run_of_previous_work(pool: PgPool) {
    let user = create_user(&pool, "viewer", "user").await;
    let app = build_test_app(pool.clone());
    let first = submit_work(&app, &user, "First").await;
    let second = submit_work(&app, &user, "Second").await;
    let run_id: i64 =
        sqlx::query_scalar("INSERT INTO runs (work_id, label) VALUES ($1, 'Tour') RETURNING id")
            .bind(first)
            .fetch_one(&pool)
            .await
            .unwrap();

    let response = post_json_auth(
        app.clone(),
        "/api/v1/logs",
        &user.token,
        json!({"work_id": first, "run": run_id, "watched_at": "2025-03-01T09:30:00Z"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let log_id = body_json(response).await["id"].as_i64().unwrap();
    let uri = format!("/api/v1/logs/{log_id}");

    let response = patch_json_auth(
        app.clone(),
        &uri,
        &user.token,
        json!({"work_id": second, "run": run_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["fields"]["run"].is_array());

    let response = patch_json_auth(app, &uri, &user.token, json!({"work_id": second})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["work"]["id"], second);
    assert!(json["run"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_work(pool: PgPool) {
    let user = create_user(&pool, "viewer", "user").await;
    let app = build_test_app(pool);
    let first = submit_work(&app, &user, "First").await;
    let second = submit_work(&app, &user, "Second").await;
    log_viewing(&app, &user, first, "2025-03-01T09:30:00Z").await;
    let wanted = log_viewing(&app, &user, second, "2025-03-02T09:30:00Z").await;

    let json = body_json(
        get_auth(app, &format!("/api/v1/logs?work={second}"), &user.token).await,
    )
    .await;
    let logs = json.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["id"], wanted);
}
