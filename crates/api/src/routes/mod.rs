pub mod actors;
pub mod admin;
pub mod auth;
pub mod health;
pub mod logs;
pub mod theaters;
pub mod troupes;
pub mod works;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// All `/api/v1` routes.
///
/// ```text
/// /works      -> works::router
/// /logs       -> logs::router
/// /theaters   -> theaters::router
/// /troupes    -> troupes::router
/// /actors     -> actors::router
/// /auth       -> auth::router
/// /admin      -> admin::router
/// GET  /tags    -> tags::list
/// POST /contact -> contact::send
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/works", works::router())
        .nest("/logs", logs::router())
        .nest("/theaters", theaters::router())
        .nest("/troupes", troupes::router())
        .nest("/actors", actors::router())
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .route("/tags", get(handlers::tags::list))
        .route("/contact", post(handlers::contact::send))
}
