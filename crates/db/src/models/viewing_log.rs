//! Viewing log model and DTOs.

use hoshidori_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::patch::nullable;
use super::validators::rating_in_range;
use super::work::WorkSummary;

/// A row from the `viewing_logs` table. `rating` is read as `float8`.
#[derive(Debug, Clone, FromRow)]
pub struct ViewingLog {
    pub id: DbId,
    pub user_id: DbId,
    pub work_id: DbId,
    pub run_id: Option<DbId>,
    pub watched_at: Timestamp,
    pub seat: String,
    pub memo: String,
    pub rating: Option<f64>,
    pub created_at: Timestamp,
}

/// Body of `POST /logs`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateViewingLog {
    /// Optional in the type so a missing value surfaces as a field error.
    pub work_id: Option<DbId>,
    pub run: Option<DbId>,
    pub watched_at: Option<Timestamp>,
    #[validate(length(max = 100))]
    pub seat: Option<String>,
    pub memo: Option<String>,
    #[validate(custom(function = "rating_in_range"))]
    pub rating: Option<f64>,
    /// Tag names; each must already exist.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `PUT`/`PATCH /logs/{id}`. Only non-`None` fields are applied;
/// `run` and `rating` are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateViewingLog {
    pub work_id: Option<DbId>,
    #[serde(default, deserialize_with = "nullable")]
    pub run: Option<Option<DbId>>,
    pub watched_at: Option<Timestamp>,
    #[validate(length(max = 100))]
    pub seat: Option<String>,
    pub memo: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(custom(function = "rating_in_range"))]
    pub rating: Option<Option<f64>>,
    pub tags: Option<Vec<String>>,
}

/// Query parameters for `GET /logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogListParams {
    pub work: Option<DbId>,
    pub run: Option<DbId>,
    pub rating: Option<f64>,
    pub ordering: Option<String>,
}

/// Fully resolved log values written by the repository.
#[derive(Debug, Clone)]
pub struct NewViewingLog {
    pub user_id: DbId,
    pub work_id: DbId,
    pub run_id: Option<DbId>,
    pub watched_at: Timestamp,
    pub seat: String,
    pub memo: String,
    pub rating: Option<f64>,
    pub tag_ids: Vec<DbId>,
}

/// Response representation of a log with its work expanded.
#[derive(Debug, Clone, Serialize)]
pub struct ViewingLogResponse {
    pub id: DbId,
    pub user: DbId,
    pub work: WorkSummary,
    pub run: Option<DbId>,
    #[serde(rename = "watchedDate")]
    pub watched_at: Timestamp,
    pub seat: String,
    pub memo: String,
    pub rating: Option<f64>,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
}
