//! Route definitions for the `/troupes` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::troupes;
use crate::state::AppState;

/// Routes mounted at `/troupes`.
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
        .route("/", get(troupes::list).post(troupes::create))
        .route(
            "/{id}",
            get(troupes::get_by_id)
                .put(troupes::update)
                .patch(troupes::update)
                .delete(troupes::delete),
        )
}
