//! Repository for the `works` table and its tag/actor links.
//!
//! Visibility rules:
//! - listings show APPROVED works that were not quick-created, plus the
//!   viewer's own works of any status;
//! - direct lookups show APPROVED and PENDING works, plus the viewer's own.

use std::collections::HashMap;

use hoshidori_core::search::{contains_pattern, WorkOrdering};
use hoshidori_core::slug::new_work_slug;
use hoshidori_core::types::DbId;
use hoshidori_core::work_status::WorkStatus;
use sqlx::{Connection, PgConnection, PgPool};

use super::actor_repo::ActorRepo;
use super::is_unique_violation;
use super::rating_repo::RatingRepo;
use super::run_repo::RunRepo;
use super::slugs::{available_slug, SlugTable};
use super::tag_repo::TagRepo;
use super::theater_repo::TheaterRepo;
use super::troupe_repo::TroupeRepo;
use crate::models::run::CreateRun;
use crate::models::work::{CreateOrGetWork, NewWork, UpdateWork, Work, WorkDetail, WorkSummary};

/// Column list for `works` queries, qualified with the `w` alias.
const COLUMNS: &str = "\
    w.id, w.title, w.slug, w.is_quick_created, w.troupe_id, w.description, \
    w.main_image, w.main_theater_id, w.status, w.admin_note, w.main_image_url, \
    w.official_site, w.official_x, w.official_instagram, w.official_tiktok, \
    w.created_by, w.created_at, w.updated_at";

/// Insert attempts before `create_or_get` gives up on fresh slugs.
const MAX_SLUG_ATTEMPTS: u32 = 5;

/// Listing filter after request parameters have been parsed.
#[derive(Debug, Clone, Default)]
pub struct WorkFilter {
    pub status: Option<WorkStatus>,
    pub main_theater: Option<DbId>,
    /// Every term must match the title, troupe name, a tag or an actor.
    pub terms: Vec<String>,
    pub ordering: WorkOrdering,
}

/// Provides queries and mutations for works.
pub struct WorkRepo;

impl WorkRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Works visible in listings to `viewer`, filtered and ordered.
    pub async fn list(
        pool: &PgPool,
        filter: &WorkFilter,
        viewer: Option<DbId>,
    ) -> Result<Vec<Work>, sqlx::Error> {
        let mut conditions = vec![
            "((w.status = 'APPROVED' AND NOT w.is_quick_created) OR w.created_by = $1)".to_string(),
        ];
        let mut bind_idx = 2u32;

        if filter.status.is_some() {
            conditions.push(format!("w.status = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.main_theater.is_some() {
            conditions.push(format!("w.main_theater_id = ${bind_idx}"));
            bind_idx += 1;
        }
        for _ in &filter.terms {
            conditions.push(format!(
                "(w.title ILIKE ${bind_idx} \
                 OR EXISTS (SELECT 1 FROM troupes t \
                     WHERE t.id = w.troupe_id AND t.name ILIKE ${bind_idx}) \
                 OR EXISTS (SELECT 1 FROM work_tags wt JOIN tags g ON g.id = wt.tag_id \
                     WHERE wt.work_id = w.id AND g.name ILIKE ${bind_idx}) \
                 OR EXISTS (SELECT 1 FROM work_actors wa JOIN actors a ON a.id = wa.actor_id \
                     WHERE wa.work_id = w.id AND a.name ILIKE ${bind_idx}))"
            ));
            bind_idx += 1;
        }

        let query = format!(
            "SELECT {COLUMNS} FROM works w WHERE {} ORDER BY {}",
            conditions.join(" AND "),
            filter.ordering.sql(),
        );

        let mut q = sqlx::query_as::<_, Work>(&query).bind(viewer);
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(theater_id) = filter.main_theater {
            q = q.bind(theater_id);
        }
        for term in &filter.terms {
            q = q.bind(contains_pattern(term));
        }
        q.fetch_all(pool).await
    }

    /// A work `viewer` may open by ID.
    pub async fn find_visible(
        pool: &PgPool,
        id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<Work>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM works w \
             WHERE w.id = $1 AND (w.status IN ('APPROVED', 'PENDING') OR w.created_by = $2)"
        );
        sqlx::query_as::<_, Work>(&query)
            .bind(id)
            .bind(viewer)
            .fetch_optional(pool)
            .await
    }

    /// A work by ID regardless of status.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Work>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM works w WHERE w.id = $1");
        sqlx::query_as::<_, Work>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Batch lookup keyed by ID, regardless of status.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, Work>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!("SELECT {COLUMNS} FROM works w WHERE w.id = ANY($1)");
        let rows = sqlx::query_as::<_, Work>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|w| (w.id, w)).collect())
    }

    async fn find_by_slug(
        conn: &mut PgConnection,
        slug: &str,
    ) -> Result<Option<Work>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM works w WHERE w.slug = $1");
        sqlx::query_as::<_, Work>(&query)
            .bind(slug)
            .fetch_optional(conn)
            .await
    }

    /// Number of viewing logs with a non-empty memo.
    pub async fn comment_count(pool: &PgPool, work_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM viewing_logs WHERE work_id = $1 AND memo <> ''")
            .bind(work_id)
            .fetch_one(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Read shapes
    // -----------------------------------------------------------------------

    /// Expand works into the list representation, preserving order.
    pub async fn summaries(
        pool: &PgPool,
        works: Vec<Work>,
    ) -> Result<Vec<WorkSummary>, sqlx::Error> {
        let ids: Vec<DbId> = works.iter().map(|w| w.id).collect();
        let troupe_ids: Vec<DbId> = works.iter().filter_map(|w| w.troupe_id).collect();
        let theater_ids: Vec<DbId> = works.iter().filter_map(|w| w.main_theater_id).collect();

        let troupes = TroupeRepo::find_by_ids(pool, &troupe_ids).await?;
        let theaters = TheaterRepo::find_by_ids(pool, &theater_ids).await?;
        let mut tags = TagRepo::names_for_works(pool, &ids).await?;
        let ratings = RatingRepo::averages(pool, &ids).await?;

        Ok(works
            .into_iter()
            .map(|work| WorkSummary {
                id: work.id,
                main_image: work.display_image(),
                troupe: work.troupe_id.and_then(|id| troupes.get(&id).cloned()),
                main_theater: work.main_theater_id.and_then(|id| theaters.get(&id).cloned()),
                tags: tags.remove(&work.id).unwrap_or_default(),
                avg_rating: ratings.get(&work.id).copied().flatten(),
                title: work.title,
                slug: work.slug,
                status: work.status,
                official_site: work.official_site,
                official_x: work.official_x,
                official_instagram: work.official_instagram,
                official_tiktok: work.official_tiktok,
                created_at: work.created_at,
            })
            .collect())
    }

    /// Expand one work into the detail representation.
    pub async fn detail(pool: &PgPool, work: Work) -> Result<WorkDetail, sqlx::Error> {
        let ids = [work.id];
        let description = work.description.clone();
        let is_quick_created = work.is_quick_created;
        let created_by = work.created_by;
        let updated_at = work.updated_at;

        let mut actors = ActorRepo::for_works(pool, &ids).await?;
        let mut runs = RunRepo::details_for_works(pool, &ids).await?;
        let comment_count = Self::comment_count(pool, work.id).await?;
        let summary = Self::summaries(pool, vec![work])
            .await?
            .pop()
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(WorkDetail {
            actors: actors.remove(&summary.id).unwrap_or_default(),
            runs: runs.remove(&summary.id).unwrap_or_default(),
            summary,
            description,
            is_quick_created,
            comment_count,
            created_by,
            updated_at,
        })
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a work with its tag and actor links in one transaction.
    ///
    /// A blank `slug` is derived from the title; a taken one gets a random
    /// suffix.
    pub async fn create(
        pool: &PgPool,
        input: &NewWork,
        tag_ids: &[DbId],
        actor_ids: &[DbId],
    ) -> Result<Work, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let slug =
            available_slug(&mut tx, SlugTable::Works, Some(&input.slug), &input.title).await?;
        let new_work = NewWork {
            slug,
            ..input.clone()
        };
        let work = Self::insert(&mut tx, &new_work).await?;
        Self::replace_tags(&mut tx, work.id, tag_ids).await?;
        Self::replace_actors(&mut tx, work.id, actor_ids).await?;
        tx.commit().await?;
        Ok(work)
    }

    pub(crate) async fn insert(
        conn: &mut PgConnection,
        input: &NewWork,
    ) -> Result<Work, sqlx::Error> {
        let query = format!(
            "INSERT INTO works AS w (\
                title, slug, status, is_quick_created, description, troupe_id, \
                main_theater_id, main_image_url, official_site, official_x, \
                official_instagram, official_tiktok, created_by\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Work>(&query)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(input.status.as_str())
            .bind(input.is_quick_created)
            .bind(&input.description)
            .bind(input.troupe_id)
            .bind(input.main_theater_id)
            .bind(&input.main_image_url)
            .bind(&input.official_site)
            .bind(&input.official_x)
            .bind(&input.official_instagram)
            .bind(&input.official_tiktok)
            .bind(input.created_by)
            .fetch_one(conn)
            .await
    }

    /// Apply a partial update. `tag_ids` / `actor_ids` replace the current
    /// links when `Some`. A `Some(None)` troupe or main theater is cleared.
    ///
    /// Returns `None` if no work with the given ID exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWork,
        tag_ids: Option<&[DbId]>,
        actor_ids: Option<&[DbId]>,
    ) -> Result<Option<Work>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE works AS w SET \
                title = COALESCE($2, title), \
                slug = COALESCE($3, slug), \
                description = COALESCE($4, description), \
                troupe_id = CASE WHEN $5 THEN $6 ELSE troupe_id END, \
                main_theater_id = CASE WHEN $7 THEN $8 ELSE main_theater_id END, \
                main_image_url = COALESCE($9, main_image_url), \
                official_site = COALESCE($10, official_site), \
                official_x = COALESCE($11, official_x), \
                official_instagram = COALESCE($12, official_instagram), \
                official_tiktok = COALESCE($13, official_tiktok), \
                status = COALESCE($14, status), \
                admin_note = COALESCE($15, admin_note) \
             WHERE w.id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Work>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(input.slug.as_deref().map(str::trim))
            .bind(input.description.as_deref())
            .bind(input.troupe_id.is_some())
            .bind(input.troupe_id.flatten())
            .bind(input.main_theater_id.is_some())
            .bind(input.main_theater_id.flatten())
            .bind(input.main_image_url.as_deref())
            .bind(input.official_site.as_deref())
            .bind(input.official_x.as_deref())
            .bind(input.official_instagram.as_deref())
            .bind(input.official_tiktok.as_deref())
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.admin_note.as_deref())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(work) = updated else {
            return Ok(None);
        };
        if let Some(tag_ids) = tag_ids {
            Self::replace_tags(&mut tx, work.id, tag_ids).await?;
        }
        if let Some(actor_ids) = actor_ids {
            Self::replace_actors(&mut tx, work.id, actor_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(work))
    }

    /// Point the work at an uploaded poster.
    pub async fn set_main_image(
        pool: &PgPool,
        id: DbId,
        path: &str,
    ) -> Result<Option<Work>, sqlx::Error> {
        let query = format!(
            "UPDATE works AS w SET main_image = $2 WHERE w.id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Work>(&query)
            .bind(id)
            .bind(path)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM works WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn replace_tags(
        conn: &mut PgConnection,
        work_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM work_tags WHERE work_id = $1")
            .bind(work_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            "INSERT INTO work_tags (work_id, tag_id) \
             SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
        )
        .bind(work_id)
        .bind(tag_ids)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub(crate) async fn replace_actors(
        conn: &mut PgConnection,
        work_id: DbId,
        actor_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM work_actors WHERE work_id = $1")
            .bind(work_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            "INSERT INTO work_actors (work_id, actor_id) \
             SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
        )
        .bind(work_id)
        .bind(actor_ids)
        .execute(conn)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // create_or_get
    // -----------------------------------------------------------------------

    /// Create a work identified by a fresh UUID slug, or return the work that
    /// already holds that slug. See [`WorkRepo::create_or_get_with_slug`].
    pub async fn create_or_get(
        pool: &PgPool,
        input: &CreateOrGetWork,
        created_by: DbId,
    ) -> Result<Work, sqlx::Error> {
        Self::create_or_get_with_slug(pool, input, created_by, new_work_slug()).await
    }

    /// Resolve the troupe by name, then insert an APPROVED work under `slug`
    /// inside one transaction.
    ///
    /// Each insert runs in a savepoint. On a slug collision the existing row
    /// with that slug is returned; if it vanished in the meantime a new UUID
    /// slug is tried. A non-blank `run_label` gets a run keyed by
    /// (work, label) either way.
    pub async fn create_or_get_with_slug(
        pool: &PgPool,
        input: &CreateOrGetWork,
        created_by: DbId,
        slug: String,
    ) -> Result<Work, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let troupe_id = match input.troupe.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => Some(TroupeRepo::get_or_create_by_name(&mut tx, name).await?.id),
            None => None,
        };

        let mut new_work = NewWork {
            title: input.title.trim().to_string(),
            slug,
            status: WorkStatus::Approved,
            troupe_id,
            main_theater_id: input.main_theater_id,
            official_site: input.official_site.clone().unwrap_or_default(),
            official_x: input.official_x.clone().unwrap_or_default(),
            official_instagram: input.official_instagram.clone().unwrap_or_default(),
            official_tiktok: input.official_tiktok.clone().unwrap_or_default(),
            created_by: Some(created_by),
            ..Default::default()
        };

        let mut attempt = 1;
        let work = loop {
            let mut savepoint = Connection::begin(&mut *tx).await?;
            match Self::insert(&mut savepoint, &new_work).await {
                Ok(work) => {
                    savepoint.commit().await?;
                    tracing::info!(work_id = work.id, user_id = created_by, "Created work");
                    break work;
                }
                Err(err) if is_unique_violation(&err, "uq_works_slug") => {
                    savepoint.rollback().await?;
                    if let Some(existing) = Self::find_by_slug(&mut tx, &new_work.slug).await? {
                        tracing::info!(
                            work_id = existing.id,
                            "Slug taken, returning existing work"
                        );
                        break existing;
                    }
                    if attempt >= MAX_SLUG_ATTEMPTS {
                        return Err(err);
                    }
                    attempt += 1;
                    new_work.slug = new_work_slug();
                }
                Err(err) => return Err(err),
            }
        };

        if let Some(label) = input.run_label.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let run = CreateRun {
                work_id: work.id,
                label: label.to_string(),
                area: input.run_area.clone().unwrap_or_default(),
                theater_id: input.run_theater_id,
                start_date: input.run_start_date,
                end_date: input.run_end_date,
            };
            RunRepo::get_or_create(&mut tx, &run).await?;
        }

        tx.commit().await?;
        Ok(work)
    }
}
