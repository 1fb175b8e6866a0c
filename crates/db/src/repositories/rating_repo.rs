//! Rating aggregation over viewing logs and standalone rating records.
//!
//! Both sources are reduced to a sum and a count in SQL, then combined by
//! [`combine_average`]. `NUMERIC(3,1)` values cross the wire as `float8`.

use std::collections::HashMap;

use hoshidori_core::rating::{combine_average, RatingTally};
use hoshidori_core::types::DbId;
use sqlx::PgPool;

use crate::models::work_rating::WorkRating;

/// Column list for `work_ratings` queries.
const COLUMNS: &str = "id, work_id, user_id, rating::float8 AS rating, created_at";

/// Per-work tallies of both rating sources.
const TALLY_SELECT: &str = "\
    SELECT w.id, \
        (SELECT SUM(l.rating)::float8 FROM viewing_logs l WHERE l.work_id = w.id), \
        (SELECT COUNT(l.rating) FROM viewing_logs l WHERE l.work_id = w.id), \
        (SELECT SUM(r.rating)::float8 FROM work_ratings r WHERE r.work_id = w.id), \
        (SELECT COUNT(*) FROM work_ratings r WHERE r.work_id = w.id) \
    FROM unnest($1::bigint[]) AS w(id)";

type TallyRow = (DbId, Option<f64>, i64, Option<f64>, i64);

/// Provides rating writes and average computation.
pub struct RatingRepo;

impl RatingRepo {
    /// Combined average for one work, `None` when nothing is rated.
    pub async fn calculate_avg_rating(
        pool: &PgPool,
        work_id: DbId,
    ) -> Result<Option<f64>, sqlx::Error> {
        let averages = Self::averages(pool, &[work_id]).await?;
        Ok(averages.get(&work_id).copied().flatten())
    }

    /// Combined averages for several works.
    pub async fn averages(
        pool: &PgPool,
        work_ids: &[DbId],
    ) -> Result<HashMap<DbId, Option<f64>>, sqlx::Error> {
        if work_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<TallyRow> = sqlx::query_as(TALLY_SELECT)
            .bind(work_ids)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, log_sum, log_count, extra_sum, extra_count)| {
                let tallies = [
                    RatingTally::new(log_sum, log_count),
                    RatingTally::new(extra_sum, extra_count),
                ];
                (id, combine_average(&tallies))
            })
            .collect())
    }

    /// Append a standalone rating and return the recomputed average.
    pub async fn add_rating_entry(
        pool: &PgPool,
        work_id: DbId,
        rating: f64,
        user_id: Option<DbId>,
    ) -> Result<Option<f64>, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_ratings (work_id, user_id, rating) \
             VALUES ($1, $2, $3::numeric(3,1)) \
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, WorkRating>(&query)
            .bind(work_id)
            .bind(user_id)
            .bind(rating)
            .fetch_one(pool)
            .await?;
        tracing::debug!(rating_id = entry.id, work_id, "Stored work rating");

        Self::calculate_avg_rating(pool, work_id).await
    }
}
