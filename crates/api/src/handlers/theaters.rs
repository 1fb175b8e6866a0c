//! Handlers for the `/theaters` resource. Reads are public.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use hoshidori_core::error::CoreError;
use hoshidori_core::types::DbId;
use hoshidori_db::models::theater::{CreateTheater, Theater, TheaterListParams, UpdateTheater};
use hoshidori_db::repositories::TheaterRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/theaters
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<TheaterListParams>,
) -> AppResult<Json<Vec<Theater>>> {
    Ok(Json(TheaterRepo::list(&state.pool, &params).await?))
}

/// POST /api/v1/theaters
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateTheater>,
) -> AppResult<(StatusCode, Json<Theater>)> {
    input.validate()?;
    let theater = TheaterRepo::create(&state.pool, &input).await?;
    tracing::info!(theater_id = theater.id, user_id = user.user_id, "Theater created");
    Ok((StatusCode::CREATED, Json(theater)))
}

/// GET /api/v1/theaters/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Theater>> {
    let theater = TheaterRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Theater",
            id,
        }))?;
    Ok(Json(theater))
}

/// PUT|PATCH /api/v1/theaters/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTheater>,
) -> AppResult<Json<Theater>> {
    input.validate()?;
    let theater = TheaterRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Theater",
            id,
        }))?;
    tracing::info!(theater_id = id, user_id = user.user_id, "Theater updated");
    Ok(Json(theater))
}

/// DELETE /api/v1/theaters/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if TheaterRepo::delete(&state.pool, id).await? {
        tracing::info!(theater_id = id, user_id = user.user_id, "Theater deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Theater",
            id,
        }))
    }
}
