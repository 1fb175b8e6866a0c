//! Handlers for the `/actors` resource. Every route requires authentication.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use hoshidori_core::error::CoreError;
use hoshidori_core::types::DbId;
use hoshidori_db::models::actor::{Actor, ActorListParams, CreateActor, UpdateActor};
use hoshidori_db::repositories::ActorRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/actors
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ActorListParams>,
) -> AppResult<Json<Vec<Actor>>> {
    Ok(Json(ActorRepo::list(&state.pool, &params).await?))
}

/// POST /api/v1/actors
///
/// Idempotent by name: an existing actor with the same (trimmed) name is
/// returned instead of a duplicate.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateActor>,
) -> AppResult<(StatusCode, Json<Actor>)> {
    input.validate()?;
    let mut conn = state.pool.acquire().await?;
    let actor = ActorRepo::create_or_get(&mut conn, input.name.trim()).await?;
    tracing::info!(actor_id = actor.id, user_id = user.user_id, "Actor registered");
    Ok((StatusCode::CREATED, Json(actor)))
}

/// GET /api/v1/actors/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Actor>> {
    let actor = ActorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Actor", id }))?;
    Ok(Json(actor))
}

/// PUT|PATCH /api/v1/actors/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateActor>,
) -> AppResult<Json<Actor>> {
    input.validate()?;
    let actor = ActorRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Actor", id }))?;
    tracing::info!(actor_id = id, user_id = user.user_id, "Actor renamed");
    Ok(Json(actor))
}

/// DELETE /api/v1/actors/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ActorRepo::delete(&state.pool, id).await? {
        tracing::info!(actor_id = id, user_id = user.user_id, "Actor deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Actor", id }))
    }
}
