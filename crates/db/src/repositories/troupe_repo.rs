//! Repository for the `troupes` table.

use std::collections::HashMap;

use hoshidori_core::search::{contains_pattern, search_terms};
use hoshidori_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use super::slugs::{available_slug, SlugTable};
use crate::models::troupe::{CreateTroupe, Troupe, TroupeListParams, UpdateTroupe};

/// Column list for `troupes` queries.
const COLUMNS: &str = "id, name, slug, official_site, image_allowed";

/// Provides CRUD operations for troupes.
pub struct TroupeRepo;

impl TroupeRepo {
    /// List troupes ordered by name. Each search term must match the name
    /// or the slug.
    pub async fn list(
        pool: &PgPool,
        params: &TroupeListParams,
    ) -> Result<Vec<Troupe>, sqlx::Error> {
        let terms = params.search.as_deref().map(search_terms).unwrap_or_default();

        let conditions: Vec<String> = (1..=terms.len())
            .map(|idx| format!("(name ILIKE ${idx} OR slug ILIKE ${idx})"))
            .collect();
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!("SELECT {COLUMNS} FROM troupes {where_clause} ORDER BY name");
        let mut q = sqlx::query_as::<_, Troupe>(&query);
        for term in &terms {
            q = q.bind(contains_pattern(term));
        }
        q.fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Troupe>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM troupes WHERE id = $1");
        sqlx::query_as::<_, Troupe>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Batch lookup keyed by ID.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, Troupe>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!("SELECT {COLUMNS} FROM troupes WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, Troupe>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|t| (t.id, t)).collect())
    }

    /// Insert a troupe. A blank slug is derived from the name.
    pub async fn create(pool: &PgPool, input: &CreateTroupe) -> Result<Troupe, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let slug = available_slug(
            &mut conn,
            SlugTable::Troupes,
            input.slug.as_deref(),
            &input.name,
        )
        .await?;

        let query = format!(
            "INSERT INTO troupes (name, slug, official_site, image_allowed) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Troupe>(&query)
            .bind(input.name.trim())
            .bind(&slug)
            .bind(input.official_site.as_deref().unwrap_or_default())
            .bind(input.image_allowed.unwrap_or(false))
            .fetch_one(&mut *conn)
            .await
    }

    /// Update a troupe. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTroupe,
    ) -> Result<Option<Troupe>, sqlx::Error> {
        let query = format!(
            "UPDATE troupes SET \
                name = COALESCE($2, name), \
                slug = COALESCE($3, slug), \
                official_site = COALESCE($4, official_site), \
                image_allowed = COALESCE($5, image_allowed) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Troupe>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.slug.as_deref().map(str::trim))
            .bind(input.official_site.as_deref())
            .bind(input.image_allowed)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM troupes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resolve a troupe by exact name, creating it with a slug derived from
    /// the name when absent.
    pub async fn get_or_create_by_name(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Troupe, sqlx::Error> {
        let find = format!("SELECT {COLUMNS} FROM troupes WHERE name = $1");
        if let Some(existing) = sqlx::query_as::<_, Troupe>(&find)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(existing);
        }

        let slug = available_slug(&mut *conn, SlugTable::Troupes, None, name).await?;
        let insert = format!(
            "INSERT INTO troupes (name, slug) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Troupe>(&insert)
            .bind(name)
            .bind(&slug)
            .fetch_optional(&mut *conn)
            .await?;

        match created {
            Some(troupe) => {
                tracing::debug!(troupe_id = troupe.id, name, "Created troupe by name");
                Ok(troupe)
            }
            // Lost a race with a concurrent insert of the same name.
            None => {
                sqlx::query_as::<_, Troupe>(&find)
                    .bind(name)
                    .fetch_one(conn)
                    .await
            }
        }
    }
}
