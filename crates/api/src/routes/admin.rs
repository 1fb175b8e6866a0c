//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin-only routes mounted at `/admin`.
///
/// ```text
/// GET  /export/{resource}  -> export (text/csv)
/// POST /import/{resource}  -> import (CSV body)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export/{resource}", get(admin::export))
        .route("/import/{resource}", post(admin::import))
}
