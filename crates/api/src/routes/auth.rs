//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::accounts;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /register  -> register
/// POST   /login     -> login
/// GET    /user      -> current_user (requires auth)
/// PATCH  /user      -> update_user (requires auth, multipart)
/// DELETE /user      -> delete_user (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route(
            "/user",
            get(accounts::current_user)
                .patch(accounts::update_user)
                .delete(accounts::delete_user),
        )
}
