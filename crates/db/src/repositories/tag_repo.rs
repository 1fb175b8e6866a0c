//! Repository for the `tags` table.

use std::collections::HashMap;

use hoshidori_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::tag::Tag;

/// Column list for `tags` queries.
const COLUMNS: &str = "id, name, created_at";

/// Provides lookups and get-or-create for tags.
pub struct TagRepo;

impl TagRepo {
    /// All tags ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags ORDER BY name");
        sqlx::query_as::<_, Tag>(&query).fetch_all(pool).await
    }

    /// Create a tag or return the existing one with the same name.
    pub async fn create_or_get(conn: &mut PgConnection, name: &str) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .fetch_one(conn)
            .await
    }

    /// Resolve tag names to IDs.
    ///
    /// Returns `Err(name)` with the first name that has no tag.
    pub async fn resolve_names(
        pool: &PgPool,
        names: &[String],
    ) -> Result<Result<Vec<DbId>, String>, sqlx::Error> {
        if names.is_empty() {
            return Ok(Ok(Vec::new()));
        }

        let rows: Vec<(DbId, String)> =
            sqlx::query_as("SELECT id, name FROM tags WHERE name = ANY($1)")
                .bind(names)
                .fetch_all(pool)
                .await?;
        let by_name: HashMap<String, DbId> = rows.into_iter().map(|(id, n)| (n, id)).collect();

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            match by_name.get(name) {
                Some(id) if !ids.contains(id) => ids.push(*id),
                Some(_) => {}
                None => return Ok(Err(name.clone())),
            }
        }
        Ok(Ok(ids))
    }

    /// Tag names attached to each of the given works, ordered by name.
    pub async fn names_for_works(
        pool: &PgPool,
        work_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<String>>, sqlx::Error> {
        let rows: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT wt.work_id, t.name FROM work_tags wt \
             JOIN tags t ON t.id = wt.tag_id \
             WHERE wt.work_id = ANY($1) \
             ORDER BY t.name",
        )
        .bind(work_ids)
        .fetch_all(pool)
        .await?;
        Ok(group_pairs(rows))
    }

    /// Tag names attached to each of the given viewing logs, ordered by name.
    pub async fn names_for_logs(
        pool: &PgPool,
        log_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<String>>, sqlx::Error> {
        let rows: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT lt.viewing_log_id, t.name FROM viewing_log_tags lt \
             JOIN tags t ON t.id = lt.tag_id \
             WHERE lt.viewing_log_id = ANY($1) \
             ORDER BY t.name",
        )
        .bind(log_ids)
        .fetch_all(pool)
        .await?;
        Ok(group_pairs(rows))
    }
}

fn group_pairs<T>(rows: Vec<(DbId, T)>) -> HashMap<DbId, Vec<T>> {
    let mut grouped: HashMap<DbId, Vec<T>> = HashMap::new();
    for (key, value) in rows {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}
