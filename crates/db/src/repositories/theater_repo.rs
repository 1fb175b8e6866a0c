//! Repository for the `theaters` table.

use std::collections::HashMap;

use hoshidori_core::search::{contains_pattern, search_terms};
use hoshidori_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use super::slugs::{available_slug, SlugTable};
use crate::models::theater::{CreateTheater, Theater, TheaterListParams, UpdateTheater};

/// Column list for `theaters` queries.
const COLUMNS: &str = "id, name, slug, area, address, image_url, area_tags";

/// Provides CRUD operations for theaters.
pub struct TheaterRepo;

impl TheaterRepo {
    /// List theaters ordered by name. Each search term must match the name,
    /// the area or one of the area tags.
    pub async fn list(
        pool: &PgPool,
        params: &TheaterListParams,
    ) -> Result<Vec<Theater>, sqlx::Error> {
        let terms = params.search.as_deref().map(search_terms).unwrap_or_default();

        let conditions: Vec<String> = (1..=terms.len())
            .map(|idx| {
                format!(
                    "(name ILIKE ${idx} OR area ILIKE ${idx} \
                     OR EXISTS (SELECT 1 FROM unnest(area_tags) AS tag WHERE tag ILIKE ${idx}))"
                )
            })
            .collect();
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!("SELECT {COLUMNS} FROM theaters {where_clause} ORDER BY name, id");
        let mut q = sqlx::query_as::<_, Theater>(&query);
        for term in &terms {
            q = q.bind(contains_pattern(term));
        }
        q.fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Theater>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM theaters WHERE id = $1");
        sqlx::query_as::<_, Theater>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Batch lookup keyed by ID.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, Theater>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!("SELECT {COLUMNS} FROM theaters WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, Theater>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|t| (t.id, t)).collect())
    }

    /// Insert a theater. A blank slug is derived from the name.
    pub async fn create(pool: &PgPool, input: &CreateTheater) -> Result<Theater, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let slug = available_slug(
            &mut conn,
            SlugTable::Theaters,
            input.slug.as_deref(),
            &input.name,
        )
        .await?;
        Self::insert(&mut conn, input, &slug).await
    }

    async fn insert(
        conn: &mut PgConnection,
        input: &CreateTheater,
        slug: &str,
    ) -> Result<Theater, sqlx::Error> {
        let query = format!(
            "INSERT INTO theaters (name, slug, area, address, image_url, area_tags) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Theater>(&query)
            .bind(input.name.trim())
            .bind(slug)
            .bind(input.area.as_deref().unwrap_or_default())
            .bind(input.address.as_deref().unwrap_or_default())
            .bind(input.image_url.as_deref().unwrap_or_default())
            .bind(input.area_tags.clone().unwrap_or_default())
            .fetch_one(conn)
            .await
    }

    /// Update a theater. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTheater,
    ) -> Result<Option<Theater>, sqlx::Error> {
        let query = format!(
            "UPDATE theaters SET \
                name = COALESCE($2, name), \
                slug = COALESCE($3, slug), \
                area = COALESCE($4, area), \
                address = COALESCE($5, address), \
                image_url = COALESCE($6, image_url), \
                area_tags = COALESCE($7, area_tags) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Theater>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.slug.as_deref().map(str::trim))
            .bind(input.area.as_deref())
            .bind(input.address.as_deref())
            .bind(input.image_url.as_deref())
            .bind(input.area_tags.as_ref())
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM theaters WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find the oldest theater with exactly this name, or create one.
    ///
    /// Names are not unique, so the lookup prefers the lowest ID.
    pub async fn get_or_create_by_name(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Theater, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM theaters WHERE name = $1 ORDER BY id LIMIT 1");
        if let Some(existing) = sqlx::query_as::<_, Theater>(&query)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(existing);
        }

        let slug = available_slug(&mut *conn, SlugTable::Theaters, None, name).await?;
        let input = CreateTheater {
            name: name.to_string(),
            ..Default::default()
        };
        tracing::debug!(name, slug = %slug, "Creating theater by name");
        Self::insert(conn, &input, &slug).await
    }
}
