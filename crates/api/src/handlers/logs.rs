//! Handlers for the `/logs` resource: the caller's own viewing logs.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use hoshidori_core::error::CoreError;
use hoshidori_core::types::DbId;
use hoshidori_db::models::viewing_log::{
    CreateViewingLog, LogListParams, NewViewingLog, UpdateViewingLog, ViewingLog,
    ViewingLogResponse,
};
use hoshidori_db::repositories::{RunRepo, TagRepo, ViewingLogRepo, WorkRepo};
use validator::Validate;

use super::resolve_tag_names;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/logs
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<LogListParams>,
) -> AppResult<Json<Vec<ViewingLogResponse>>> {
    let logs = ViewingLogRepo::list(&state.pool, user.user_id, &params).await?;
    Ok(Json(expand(&state, logs).await?))
}

/// POST /api/v1/logs
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateViewingLog>,
) -> AppResult<(StatusCode, Json<ViewingLogResponse>)> {
    input.validate()?;

    let work_id = input
        .work_id
        .ok_or_else(|| AppError::field("work_id", "This field is required."))?;
    let watched_at = input
        .watched_at
        .ok_or_else(|| AppError::field("watched_at", "This field is required."))?;
    check_work(&state, work_id, user.user_id).await?;
    if let Some(run_id) = input.run {
        check_run(&state, run_id, work_id).await?;
    }
    let tag_ids = resolve_tag_names(&state, &input.tags).await?;

    let new_log = NewViewingLog {
        user_id: user.user_id,
        work_id,
        run_id: input.run,
        watched_at,
        seat: input.seat.clone().unwrap_or_default(),
        memo: input.memo.clone().unwrap_or_default(),
        rating: input.rating,
        tag_ids,
    };
    let log = ViewingLogRepo::create(&state.pool, &new_log).await?;
    tracing::info!(log_id = log.id, work_id, user_id = user.user_id, "Viewing log created");

    Ok((StatusCode::CREATED, Json(expand_one(&state, log).await?)))
}

/// GET /api/v1/logs/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ViewingLogResponse>> {
    let log = own_log(&state, id, user.user_id).await?;
    Ok(Json(expand_one(&state, log).await?))
}

/// PUT|PATCH /api/v1/logs/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateViewingLog>,
) -> AppResult<Json<ViewingLogResponse>> {
    input.validate()?;
    let current = own_log(&state, id, user.user_id).await?;

    let work_id = input.work_id.unwrap_or(current.work_id);
    if input.work_id.is_some() {
        check_work(&state, work_id, user.user_id).await?;
    }
    match input.run {
        Some(Some(run_id)) => check_run(&state, run_id, work_id).await?,
        // The stored run belongs to the previous work.
        None if work_id != current.work_id && current.run_id.is_some() => {
            input.run = Some(None);
        }
        Some(None) | None => {}
    }
    let tag_ids = match input.tags.as_deref() {
        Some(names) => Some(resolve_tag_names(&state, names).await?),
        None => None,
    };

    let log = ViewingLogRepo::update(&state.pool, id, user.user_id, &input, tag_ids.as_deref())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ViewingLog",
            id,
        }))?;
    tracing::info!(log_id = id, user_id = user.user_id, "Viewing log updated");

    Ok(Json(expand_one(&state, log).await?))
}

/// DELETE /api/v1/logs/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ViewingLogRepo::delete(&state.pool, id, user.user_id).await? {
        tracing::info!(log_id = id, user_id = user.user_id, "Viewing log deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "ViewingLog",
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn own_log(state: &AppState, id: DbId, user_id: DbId) -> AppResult<ViewingLog> {
    ViewingLogRepo::find_own(&state.pool, id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ViewingLog",
            id,
        }))
}

/// The work must exist and be visible to the logging user.
async fn check_work(state: &AppState, work_id: DbId, user_id: DbId) -> AppResult<()> {
    match WorkRepo::find_visible(&state.pool, work_id, Some(user_id)).await? {
        Some(_) => Ok(()),
        None => Err(AppError::field(
            "work_id",
            format!("Invalid pk \"{work_id}\" - object does not exist."),
        )),
    }
}

/// The run must exist and belong to the logged work.
async fn check_run(state: &AppState, run_id: DbId, work_id: DbId) -> AppResult<()> {
    match RunRepo::find_by_id(&state.pool, run_id).await? {
        Some(run) if run.work_id == work_id => Ok(()),
        Some(_) => Err(AppError::field("run", "The run does not belong to this work.")),
        None => Err(AppError::field(
            "run",
            format!("Invalid pk \"{run_id}\" - object does not exist."),
        )),
    }
}

async fn expand_one(state: &AppState, log: ViewingLog) -> AppResult<ViewingLogResponse> {
    let id = log.id;
    expand(state, vec![log])
        .await?
        .pop()
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ViewingLog",
            id,
        }))
}

/// Attach the work's list representation and tag names to each log.
async fn expand(state: &AppState, logs: Vec<ViewingLog>) -> AppResult<Vec<ViewingLogResponse>> {
    let log_ids: Vec<DbId> = logs.iter().map(|l| l.id).collect();
    let mut work_ids: Vec<DbId> = logs.iter().map(|l| l.work_id).collect();
    work_ids.sort_unstable();
    work_ids.dedup();

    let works = WorkRepo::find_by_ids(&state.pool, &work_ids).await?;
    let summaries: HashMap<DbId, _> =
        WorkRepo::summaries(&state.pool, works.into_values().collect())
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();
    let mut tags = TagRepo::names_for_logs(&state.pool, &log_ids).await?;

    Ok(logs
        .into_iter()
        .filter_map(|log| {
            let work = summaries.get(&log.work_id)?.clone();
            Some(ViewingLogResponse {
                id: log.id,
                user: log.user_id,
                work,
                run: log.run_id,
                watched_at: log.watched_at,
                seat: log.seat,
                memo: log.memo,
                rating: log.rating,
                tags: tags.remove(&log.id).unwrap_or_default(),
                created_at: log.created_at,
            })
        })
        .collect())
}
