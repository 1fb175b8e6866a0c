//! Handlers for the `/works` resource.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use hoshidori_core::error::CoreError;
use hoshidori_core::schedule::{local_day_bounds, local_today, today_times as times_on_day};
use hoshidori_core::search::{search_terms, WorkOrdering};
use hoshidori_core::types::DbId;
use hoshidori_core::work_status::WorkStatus;
use hoshidori_db::models::run::RunDetail;
use hoshidori_db::models::work::{
    CreateOrGetWork, CreateWork, NewWork, UpdateWork, Work, WorkDetail, WorkListParams,
    WorkSummary,
};
use hoshidori_db::models::work_rating::RateWork;
use hoshidori_db::repositories::work_repo::WorkFilter;
use hoshidori_db::repositories::{RatingRepo, RunRepo, ViewingLogRepo, WorkRepo};
use serde::Serialize;
use validator::Validate;

use super::{check_actor_ids, resolve_tag_names};
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::media::{read_form, store_image};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::state::AppState;

/// Folder below the media root for uploaded posters.
const POSTER_FOLDER: &str = "works";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response of `GET /works/{id}/schedule`.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub work_id: DbId,
    pub title: String,
    pub runs: Vec<RunDetail>,
}

/// Response of `GET /works/{id}/today_times`.
#[derive(Debug, Serialize)]
pub struct TodayTimesResponse {
    pub times: Vec<String>,
}

/// Response of `POST /works/{id}/rate`.
#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub avg_rating: Option<f64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/works
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(params): Query<WorkListParams>,
) -> AppResult<Json<Vec<WorkSummary>>> {
    let status = match params.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(WorkStatus::parse(raw).ok_or_else(|| {
            AppError::field("status", format!("\"{raw}\" is not a valid status."))
        })?),
        None => None,
    };

    let filter = WorkFilter {
        status,
        main_theater: params.main_theater,
        terms: params.search.as_deref().map(search_terms).unwrap_or_default(),
        ordering: WorkOrdering::parse(params.ordering.as_deref()),
    };

    let works = WorkRepo::list(&state.pool, &filter, viewer.user_id()).await?;
    Ok(Json(WorkRepo::summaries(&state.pool, works).await?))
}

/// POST /api/v1/works
///
/// New works start as PENDING and belong to the caller.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateWork>,
) -> AppResult<(StatusCode, Json<WorkDetail>)> {
    input.validate()?;

    let tag_ids = resolve_tag_names(&state, input.tags.as_deref().unwrap_or_default()).await?;
    let actor_ids = input.actors.clone().unwrap_or_default();
    check_actor_ids(&state, &actor_ids).await?;

    let new_work = NewWork {
        title: input.title.trim().to_string(),
        slug: input.slug.clone().unwrap_or_default(),
        status: WorkStatus::Pending,
        is_quick_created: input.is_quick_created,
        description: input.description.clone().unwrap_or_default(),
        troupe_id: input.troupe_id,
        main_theater_id: input.main_theater_id,
        main_image_url: input.main_image_url.clone().unwrap_or_default(),
        official_site: input.official_site.clone().unwrap_or_default(),
        official_x: input.official_x.clone().unwrap_or_default(),
        official_instagram: input.official_instagram.clone().unwrap_or_default(),
        official_tiktok: input.official_tiktok.clone().unwrap_or_default(),
        created_by: Some(user.user_id),
    };

    let work = WorkRepo::create(&state.pool, &new_work, &tag_ids, &actor_ids).await?;
    tracing::info!(work_id = work.id, user_id = user.user_id, "Work submitted");

    let detail = WorkRepo::detail(&state.pool, work).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/works/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<WorkDetail>> {
    let work = visible_work(&state, id, viewer.user_id()).await?;
    Ok(Json(WorkRepo::detail(&state.pool, work).await?))
}

/// PUT|PATCH /api/v1/works/{id}
///
/// Both verbs apply a partial update. Only the creator or an admin may edit,
/// and only an admin may change `status` or `admin_note`.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWork>,
) -> AppResult<Json<WorkDetail>> {
    editable_work(&state, id, &user).await?;
    if !user.is_admin() && (input.status.is_some() || input.admin_note.is_some()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only an admin can change the status or admin note".into(),
        )));
    }
    input.validate()?;

    let tag_ids = match input.tags.as_deref() {
        Some(names) => Some(resolve_tag_names(&state, names).await?),
        None => None,
    };
    if let Some(actor_ids) = input.actors.as_deref() {
        check_actor_ids(&state, actor_ids).await?;
    }

    let updated = WorkRepo::update(
        &state.pool,
        id,
        &input,
        tag_ids.as_deref(),
        input.actors.as_deref(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Work", id }))?;
    tracing::info!(work_id = id, user_id = user.user_id, "Work updated");

    Ok(Json(WorkRepo::detail(&state.pool, updated).await?))
}

/// DELETE /api/v1/works/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    editable_work(&state, id, &user).await?;

    if WorkRepo::delete(&state.pool, id).await? {
        tracing::info!(work_id = id, user_id = user.user_id, "Work deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Work", id }))
    }
}

/// PUT /api/v1/works/{id}/image
///
/// Multipart upload of the poster in the `main_image` field.
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<WorkDetail>> {
    editable_work(&state, id, &user).await?;

    let mut form = read_form(multipart).await?;
    let file = form
        .take_file("main_image")
        .ok_or_else(|| AppError::field("main_image", "No file was submitted."))?;
    let path = store_image(&state.config.media_dir, POSTER_FOLDER, "main_image", &file).await?;

    let updated = WorkRepo::set_main_image(&state.pool, id, &path)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Work", id }))?;
    Ok(Json(WorkRepo::detail(&state.pool, updated).await?))
}

/// GET /api/v1/works/{id}/schedule
pub async fn schedule(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ScheduleResponse>> {
    let work = visible_work(&state, id, viewer.user_id()).await?;
    let mut runs = RunRepo::details_for_works(&state.pool, &[work.id]).await?;

    Ok(Json(ScheduleResponse {
        work_id: work.id,
        runs: runs.remove(&work.id).unwrap_or_default(),
        title: work.title,
    }))
}

/// GET /api/v1/works/{id}/today_times
///
/// Distinct `HH:MM` viewing times logged for the work on today's local date.
pub async fn today_times(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<TodayTimesResponse>> {
    let work = visible_work(&state, id, viewer.user_id()).await?;

    let offset = state.config.local_offset;
    let today = local_today(Utc::now(), offset);
    let (from, to) = local_day_bounds(today, offset);
    let watched = ViewingLogRepo::watched_times(&state.pool, work.id, from, to).await?;

    Ok(Json(TodayTimesResponse {
        times: times_on_day(&watched, today, offset),
    }))
}

/// POST /api/v1/works/{id}/rate
///
/// Anonymous ratings are accepted; an authenticated caller is recorded.
pub async fn rate(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<RateWork>,
) -> AppResult<Json<RateResponse>> {
    input.validate()?;
    let work = visible_work(&state, id, viewer.user_id()).await?;

    let avg_rating =
        RatingRepo::add_rating_entry(&state.pool, work.id, input.rating, viewer.user_id()).await?;
    tracing::info!(
        work_id = work.id,
        user_id = ?viewer.user_id(),
        rating = input.rating,
        "Work rated"
    );

    Ok(Json(RateResponse { avg_rating }))
}

/// POST /api/v1/works/create_or_get
///
/// Quick registration from the log form: resolves the troupe by name,
/// creates an APPROVED work and optionally its first run.
pub async fn create_or_get(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateOrGetWork>,
) -> AppResult<(StatusCode, Json<WorkDetail>)> {
    input.validate()?;

    let work = WorkRepo::create_or_get(&state.pool, &input, user.user_id).await?;
    let detail = WorkRepo::detail(&state.pool, work).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a work the viewer may open, or 404.
async fn visible_work(state: &AppState, id: DbId, viewer: Option<DbId>) -> AppResult<Work> {
    WorkRepo::find_visible(&state.pool, id, viewer)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Work", id }))
}

/// Load a work `user` may modify. Admins reach works of any status; other
/// callers must see the work and have created it.
async fn editable_work(state: &AppState, id: DbId, user: &AuthUser) -> AppResult<Work> {
    if user.is_admin() {
        return WorkRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "Work", id }));
    }

    let work = visible_work(state, id, Some(user.user_id)).await?;
    if work.created_by == Some(user.user_id) {
        Ok(work)
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the creator or an admin can modify this work".into(),
        )))
    }
}
