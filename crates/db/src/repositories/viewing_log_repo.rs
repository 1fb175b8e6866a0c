//! Repository for the `viewing_logs` table and its tag links.
//!
//! Every query is scoped to the owning user.

use hoshidori_core::search::LogOrdering;
use hoshidori_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::viewing_log::{LogListParams, NewViewingLog, UpdateViewingLog, ViewingLog};

/// Column list for `viewing_logs` queries, qualified with the `l` alias.
const COLUMNS: &str = "\
    l.id, l.user_id, l.work_id, l.run_id, l.watched_at, l.seat, l.memo, \
    l.rating::float8 AS rating, l.created_at";

/// Provides CRUD operations for a user's viewing logs.
pub struct ViewingLogRepo;

impl ViewingLogRepo {
    /// The user's logs, filtered and ordered.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        params: &LogListParams,
    ) -> Result<Vec<ViewingLog>, sqlx::Error> {
        let mut conditions = vec!["l.user_id = $1".to_string()];
        let mut bind_idx = 2u32;

        if params.work.is_some() {
            conditions.push(format!("l.work_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.run.is_some() {
            conditions.push(format!("l.run_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.rating.is_some() {
            conditions.push(format!("l.rating = ${bind_idx}::numeric(3,1)"));
        }

        let ordering = LogOrdering::parse(params.ordering.as_deref());
        let query = format!(
            "SELECT {COLUMNS} FROM viewing_logs l WHERE {} ORDER BY {}",
            conditions.join(" AND "),
            ordering.sql(),
        );

        let mut q = sqlx::query_as::<_, ViewingLog>(&query).bind(user_id);
        if let Some(work_id) = params.work {
            q = q.bind(work_id);
        }
        if let Some(run_id) = params.run {
            q = q.bind(run_id);
        }
        if let Some(rating) = params.rating {
            q = q.bind(rating);
        }
        q.fetch_all(pool).await
    }

    /// One of the user's logs.
    pub async fn find_own(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<ViewingLog>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM viewing_logs l WHERE l.id = $1 AND l.user_id = $2");
        sqlx::query_as::<_, ViewingLog>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a log and its tag links in one transaction.
    pub async fn create(pool: &PgPool, input: &NewViewingLog) -> Result<ViewingLog, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO viewing_logs AS l \
                (user_id, work_id, run_id, watched_at, seat, memo, rating) \
             VALUES ($1, $2, $3, $4, $5, $6, $7::numeric(3,1)) \
             RETURNING {COLUMNS}"
        );
        let log = sqlx::query_as::<_, ViewingLog>(&query)
            .bind(input.user_id)
            .bind(input.work_id)
            .bind(input.run_id)
            .bind(input.watched_at)
            .bind(&input.seat)
            .bind(&input.memo)
            .bind(input.rating)
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_tags(&mut tx, log.id, &input.tag_ids).await?;
        tx.commit().await?;
        Ok(log)
    }

    /// Apply a partial update to one of the user's logs. `tag_ids` replaces
    /// the current tags when `Some`; `Some(None)` clears the run or rating.
    ///
    /// Returns `None` if the log does not exist or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateViewingLog,
        tag_ids: Option<&[DbId]>,
    ) -> Result<Option<ViewingLog>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE viewing_logs AS l SET \
                work_id = COALESCE($3, work_id), \
                run_id = CASE WHEN $4 THEN $5 ELSE run_id END, \
                watched_at = COALESCE($6, watched_at), \
                seat = COALESCE($7, seat), \
                memo = COALESCE($8, memo), \
                rating = CASE WHEN $9 THEN $10::numeric(3,1) ELSE rating END \
             WHERE l.id = $1 AND l.user_id = $2 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ViewingLog>(&query)
            .bind(id)
            .bind(user_id)
            .bind(input.work_id)
            .bind(input.run.is_some())
            .bind(input.run.flatten())
            .bind(input.watched_at)
            .bind(input.seat.as_deref())
            .bind(input.memo.as_deref())
            .bind(input.rating.is_some())
            .bind(input.rating.flatten())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(log) = updated else {
            return Ok(None);
        };
        if let Some(tag_ids) = tag_ids {
            Self::replace_tags(&mut tx, log.id, tag_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(log))
    }

    /// Delete one of the user's logs. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM viewing_logs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Viewing times of a work within `[from, to)`, across all users.
    pub async fn watched_times(
        pool: &PgPool,
        work_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Timestamp>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT watched_at FROM viewing_logs \
             WHERE work_id = $1 AND watched_at >= $2 AND watched_at < $3",
        )
        .bind(work_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    async fn replace_tags(
        conn: &mut PgConnection,
        log_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM viewing_log_tags WHERE viewing_log_id = $1")
            .bind(log_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            "INSERT INTO viewing_log_tags (viewing_log_id, tag_id) \
             SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
        )
        .bind(log_id)
        .bind(tag_ids)
        .execute(conn)
        .await?;
        Ok(())
    }
}
