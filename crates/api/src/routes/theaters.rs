//! Route definitions for the `/theaters` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::theaters;
use crate::state::AppState;

/// Routes mounted at `/theaters`.
///
/// ```text
/// GET    /      -> list
/// POST   /      -> create
/// GET    /{id}  -> get_by_id
/// PUT    /{id}  -> update
/// PATCH  /{id}  -> update
/// DELETE /{id}  -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(theaters::list).post(theaters::create))
        .route(
            "/{id}",
            get(theaters::get_by_id)
                .put(theaters::update)
                .patch(theaters::update)
                .delete(theaters::delete),
        )
}
