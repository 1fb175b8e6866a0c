pub mod accounts;
pub mod actors;
pub mod admin;
pub mod contact;
pub mod logs;
pub mod tags;
pub mod theaters;
pub mod troupes;
pub mod works;

use hoshidori_core::types::DbId;
use hoshidori_db::repositories::{ActorRepo, TagRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Map tag names to IDs. Tags are never created implicitly from a request
/// body; an unknown name is a field error on `tags`.
pub(crate) async fn resolve_tag_names(state: &AppState, names: &[String]) -> AppResult<Vec<DbId>> {
    let names: Vec<String> = names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    TagRepo::resolve_names(&state.pool, &names)
        .await?
        .map_err(|missing| AppError::field("tags", format!("Tag \"{missing}\" does not exist.")))
}

/// Reject actor IDs that do not exist as a field error on `actors`.
pub(crate) async fn check_actor_ids(state: &AppState, ids: &[DbId]) -> AppResult<()> {
    let missing = ActorRepo::missing_ids(&state.pool, ids).await?;
    match missing.first() {
        Some(id) => Err(AppError::field(
            "actors",
            format!("Invalid pk \"{id}\" - object does not exist."),
        )),
        None => Ok(()),
    }
}
