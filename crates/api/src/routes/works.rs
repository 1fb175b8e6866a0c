//! Route definitions for the `/works` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::works;
use crate::state::AppState;

/// Routes mounted at `/works`.
///
/// ```text
/// GET    /                  -> list (auth optional)
/// POST   /                  -> create
/// POST   /create_or_get     -> create_or_get
/// GET    /{id}              -> get_by_id (auth optional)
/// PUT    /{id}              -> update
/// PATCH  /{id}              -> update
/// DELETE /{id}              -> delete
/// PUT    /{id}/image        -> upload_image
/// GET    /{id}/schedule     -> schedule (auth optional)
/// GET    /{id}/today_times  -> today_times (auth optional)
/// POST   /{id}/rate         -> rate (auth optional)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(works::list).post(works::create))
        .route("/create_or_get", post(works::create_or_get))
        .route(
            "/{id}",
            get(works::get_by_id)
                .put(works::update)
                .patch(works::update)
                .delete(works::delete),
        )
        .route("/{id}/image", put(works::upload_image))
        .route("/{id}/schedule", get(works::schedule))
        .route("/{id}/today_times", get(works::today_times))
        .route("/{id}/rate", post(works::rate))
}
