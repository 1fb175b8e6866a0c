//! Handler for the `/tags` resource.

use axum::extract::State;
use hoshidori_db::models::tag::TagOption;
use hoshidori_db::repositories::TagRepo;

use crate::error::AppResult;
use crate::extract::Json;
use crate::state::AppState;

/// GET /api/v1/tags
///
/// All tags as `{value, label}` pairs, ordered by name.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<TagOption>>> {
    let tags = TagRepo::list(&state.pool).await?;
    Ok(Json(tags.into_iter().map(TagOption::from).collect()))
}
