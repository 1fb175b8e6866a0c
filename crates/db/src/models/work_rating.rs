//! Standalone rating records (guests, or users rating without a log).

use hoshidori_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validators::rating_in_range;

/// A row from the `work_ratings` table. `rating` is read as `float8`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkRating {
    pub id: DbId,
    pub work_id: DbId,
    pub user_id: Option<DbId>,
    pub rating: f64,
    pub created_at: Timestamp,
}

/// Request body for `POST /works/{id}/rate`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateWork {
    #[validate(custom(function = "rating_in_range"))]
    pub rating: f64,
}
