//! Handlers for the `/troupes` resource. Reads are public.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use hoshidori_core::error::CoreError;
use hoshidori_core::types::DbId;
use hoshidori_db::models::troupe::{CreateTroupe, Troupe, TroupeListParams, UpdateTroupe};
use hoshidori_db::repositories::TroupeRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/troupes
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<TroupeListParams>,
) -> AppResult<Json<Vec<Troupe>>> {
    Ok(Json(TroupeRepo::list(&state.pool, &params).await?))
}

/// POST /api/v1/troupes
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateTroupe>,
) -> AppResult<(StatusCode, Json<Troupe>)> {
    input.validate()?;
    let troupe = TroupeRepo::create(&state.pool, &input).await?;
    tracing::info!(troupe_id = troupe.id, user_id = user.user_id, "Troupe created");
    Ok((StatusCode::CREATED, Json(troupe)))
}

/// GET /api/v1/troupes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Troupe>> {
    let troupe = TroupeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Troupe",
            id,
        }))?;
    Ok(Json(troupe))
}

/// PUT|PATCH /api/v1/troupes/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTroupe>,
) -> AppResult<Json<Troupe>> {
    input.validate()?;
    let troupe = TroupeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Troupe",
            id,
        }))?;
    tracing::info!(troupe_id = id, user_id = user.user_id, "Troupe updated");
    Ok(Json(troupe))
}

/// DELETE /api/v1/troupes/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if TroupeRepo::delete(&state.pool, id).await? {
        tracing::info!(troupe_id = id, user_id = user.user_id, "Troupe deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Troupe",
            id,
        }))
    }
}
