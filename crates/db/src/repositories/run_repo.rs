//! Repository for the `runs` table.

use std::collections::HashMap;

use hoshidori_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use super::theater_repo::TheaterRepo;
use crate::models::run::{CreateRun, Run, RunDetail};

/// Column list for `runs` queries.
pub(crate) const COLUMNS: &str = "id, work_id, label, area, theater_id, start_date, end_date";

/// Runs are listed chronologically, undated runs last.
const ORDER: &str = "start_date ASC NULLS LAST, id ASC";

/// Provides lookups and get-or-create for runs.
pub struct RunRepo;

impl RunRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE id = $1");
        sqlx::query_as::<_, Run>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Runs of several works with their theaters expanded.
    pub async fn details_for_works(
        pool: &PgPool,
        work_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<RunDetail>>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE work_id = ANY($1) ORDER BY {ORDER}");
        let runs = sqlx::query_as::<_, Run>(&query)
            .bind(work_ids)
            .fetch_all(pool)
            .await?;

        let mut theater_ids: Vec<DbId> = runs.iter().filter_map(|r| r.theater_id).collect();
        theater_ids.sort_unstable();
        theater_ids.dedup();
        let theaters = TheaterRepo::find_by_ids(pool, &theater_ids).await?;

        let mut grouped: HashMap<DbId, Vec<RunDetail>> = HashMap::new();
        for run in runs {
            let theater = run.theater_id.and_then(|id| theaters.get(&id).cloned());
            grouped.entry(run.work_id).or_default().push(RunDetail {
                id: run.id,
                label: run.label,
                area: run.area,
                theater,
                start_date: run.start_date,
                end_date: run.end_date,
            });
        }
        Ok(grouped)
    }

    /// Find the run of `input.work_id` labelled `input.label`, or create it
    /// with the remaining fields as defaults.
    pub async fn get_or_create(
        conn: &mut PgConnection,
        input: &CreateRun,
    ) -> Result<Run, sqlx::Error> {
        let find = format!(
            "SELECT {COLUMNS} FROM runs WHERE work_id = $1 AND label = $2 ORDER BY id LIMIT 1"
        );
        if let Some(existing) = sqlx::query_as::<_, Run>(&find)
            .bind(input.work_id)
            .bind(&input.label)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(existing);
        }

        Self::insert(conn, input).await
    }

    pub async fn insert(conn: &mut PgConnection, input: &CreateRun) -> Result<Run, sqlx::Error> {
        let query = format!(
            "INSERT INTO runs (work_id, label, area, theater_id, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(input.work_id)
            .bind(&input.label)
            .bind(&input.area)
            .bind(input.theater_id)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_one(conn)
            .await
    }
}
