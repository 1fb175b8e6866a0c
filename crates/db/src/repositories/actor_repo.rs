//! Repository for the `actors` table.

use std::collections::HashMap;

use hoshidori_core::search::{contains_pattern, search_terms};
use hoshidori_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::actor::{Actor, ActorListParams, UpdateActor};

/// Column list for `actors` queries.
const COLUMNS: &str = "id, name";

/// Provides CRUD operations for actors.
pub struct ActorRepo;

impl ActorRepo {
    /// List actors ordered by name, optionally narrowed by a name search.
    pub async fn list(pool: &PgPool, params: &ActorListParams) -> Result<Vec<Actor>, sqlx::Error> {
        let terms = params.search.as_deref().map(search_terms).unwrap_or_default();

        let mut conditions = Vec::new();
        for idx in 1..=terms.len() {
            conditions.push(format!("name ILIKE ${idx}"));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!("SELECT {COLUMNS} FROM actors {where_clause} ORDER BY name");
        let mut q = sqlx::query_as::<_, Actor>(&query);
        for term in &terms {
            q = q.bind(contains_pattern(term));
        }
        q.fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Actor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM actors WHERE id = $1");
        sqlx::query_as::<_, Actor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create an actor or return the existing one with the same name.
    pub async fn create_or_get(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Actor, sqlx::Error> {
        let query = format!(
            "INSERT INTO actors (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Actor>(&query)
            .bind(name)
            .fetch_one(conn)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateActor,
    ) -> Result<Option<Actor>, sqlx::Error> {
        let query = format!(
            "UPDATE actors SET name = COALESCE($2, name) WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Actor>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM actors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// IDs from `ids` that have no actor row.
    pub async fn missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<DbId> = sqlx::query_scalar("SELECT id FROM actors WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    /// Actors linked to each of the given works, ordered by name.
    pub async fn for_works(
        pool: &PgPool,
        work_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<Actor>>, sqlx::Error> {
        let rows: Vec<(DbId, DbId, String)> = sqlx::query_as(
            "SELECT wa.work_id, a.id, a.name FROM work_actors wa \
             JOIN actors a ON a.id = wa.actor_id \
             WHERE wa.work_id = ANY($1) \
             ORDER BY a.name",
        )
        .bind(work_ids)
        .fetch_all(pool)
        .await?;

        let mut grouped: HashMap<DbId, Vec<Actor>> = HashMap::new();
        for (work_id, id, name) in rows {
            grouped.entry(work_id).or_default().push(Actor { id, name });
        }
        Ok(grouped)
    }
}
