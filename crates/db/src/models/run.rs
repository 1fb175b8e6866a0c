//! Run (block of performances) model.

use chrono::NaiveDate;
use hoshidori_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

use super::theater::Theater;

/// A row from the `runs` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Run {
    pub id: DbId,
    pub work_id: DbId,
    /// e.g. "Tokyo run", "Osaka run".
    pub label: String,
    pub area: String,
    pub theater_id: Option<DbId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A run with its theater expanded, as shown in work schedules.
#[derive(Debug, Clone, Serialize)]
pub struct RunDetail {
    pub id: DbId,
    pub label: String,
    pub area: String,
    pub theater: Option<Theater>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Fields of a new run. Used by `create_or_get` and CSV import.
#[derive(Debug, Clone, Default)]
pub struct CreateRun {
    pub work_id: DbId,
    pub label: String,
    pub area: String,
    pub theater_id: Option<DbId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
