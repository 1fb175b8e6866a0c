//! Bulk CSV import and export of catalog tables.
//!
//! Name columns are resolved the way an editor would type them: an exact
//! (trimmed) name match, otherwise a new row. Each imported row runs in its
//! own transaction so a bad row never rolls back the others.

use hoshidori_core::csv_import::{
    join_names, non_blank, parse_bool, split_names, ImportSummary, ParsedRow, RunCsvRow,
    TheaterCsvRow, TroupeCsvRow, WorkCsvRow,
};
use hoshidori_core::types::DbId;
use hoshidori_core::work_status::WorkStatus;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use super::actor_repo::ActorRepo;
use super::run_repo::{RunRepo, COLUMNS as RUN_COLUMNS};
use super::slugs::{available_slug, SlugTable};
use super::tag_repo::TagRepo;
use super::theater_repo::TheaterRepo;
use super::troupe_repo::TroupeRepo;
use super::work_repo::WorkRepo;
use crate::models::run::{CreateRun, Run};
use crate::models::theater::Theater;
use crate::models::troupe::Troupe;
use crate::models::work::NewWork;

/// Result of applying one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Created,
    Updated,
}

/// Why a row was rejected.
#[derive(Debug, thiserror::Error)]
enum RowFailure {
    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn invalid(message: impl Into<String>) -> RowFailure {
    RowFailure::Invalid(message.into())
}

type ExportedWork = (
    DbId,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Vec<String>,
    Vec<String>,
);

/// Provides CSV-oriented resolution, import and export.
pub struct ImportRepo;

impl ImportRepo {
    // -----------------------------------------------------------------------
    // Resolution widgets
    // -----------------------------------------------------------------------

    /// Resolve a `main_theater` cell. Blank yields `None`.
    pub async fn resolve_theater(
        conn: &mut PgConnection,
        cell: Option<&str>,
    ) -> Result<Option<Theater>, sqlx::Error> {
        match non_blank(cell) {
            Some(name) => Ok(Some(TheaterRepo::get_or_create_by_name(conn, name).await?)),
            None => Ok(None),
        }
    }

    /// Resolve a `troupe` cell. Blank yields `None`.
    pub async fn resolve_troupe(
        conn: &mut PgConnection,
        cell: Option<&str>,
    ) -> Result<Option<Troupe>, sqlx::Error> {
        match non_blank(cell) {
            Some(name) => Ok(Some(TroupeRepo::get_or_create_by_name(conn, name).await?)),
            None => Ok(None),
        }
    }

    /// Resolve an `actors` cell to actor IDs, one per distinct name.
    pub async fn resolve_actors(
        conn: &mut PgConnection,
        cell: Option<&str>,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut ids = Vec::new();
        for name in split_names(cell) {
            ids.push(ActorRepo::create_or_get(&mut *conn, &name).await?.id);
        }
        Ok(ids)
    }

    /// Resolve a `tags` cell to tag IDs, one per distinct name.
    pub async fn resolve_tags(
        conn: &mut PgConnection,
        cell: Option<&str>,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut ids = Vec::new();
        for name in split_names(cell) {
            ids.push(TagRepo::create_or_get(&mut *conn, &name).await?.id);
        }
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Import
    // -----------------------------------------------------------------------

    pub async fn import_theaters(
        pool: &PgPool,
        rows: Vec<ParsedRow<TheaterCsvRow>>,
    ) -> Result<ImportSummary, sqlx::Error> {
        import_rows(pool, rows).await
    }

    pub async fn import_troupes(
        pool: &PgPool,
        rows: Vec<ParsedRow<TroupeCsvRow>>,
    ) -> Result<ImportSummary, sqlx::Error> {
        import_rows(pool, rows).await
    }

    pub async fn import_works(
        pool: &PgPool,
        rows: Vec<ParsedRow<WorkCsvRow>>,
    ) -> Result<ImportSummary, sqlx::Error> {
        import_rows(pool, rows).await
    }

    pub async fn import_runs(
        pool: &PgPool,
        rows: Vec<ParsedRow<RunCsvRow>>,
    ) -> Result<ImportSummary, sqlx::Error> {
        import_rows(pool, rows).await
    }

    async fn theater_row(
        conn: &mut PgConnection,
        row: TheaterCsvRow,
    ) -> Result<RowOutcome, RowFailure> {
        let name = row.name.trim();
        if name.is_empty() {
            return Err(invalid("name is required"));
        }
        let area_tags = split_names(row.area_tags.as_deref());
        let requested_slug = non_blank(row.slug.as_deref());

        if let Some(id) = row.id {
            let result = sqlx::query(
                "UPDATE theaters SET \
                    name = $2, slug = COALESCE($3, slug), area = $4, address = $5, \
                    image_url = $6, area_tags = $7 \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(name)
            .bind(requested_slug)
            .bind(row.area.as_deref().unwrap_or_default())
            .bind(row.address.as_deref().unwrap_or_default())
            .bind(row.image_url.as_deref().unwrap_or_default())
            .bind(&area_tags)
            .execute(conn)
            .await?;
            return if result.rows_affected() > 0 {
                Ok(RowOutcome::Updated)
            } else {
                Err(invalid(format!("theater {id} does not exist")))
            };
        }

        let slug = available_slug(&mut *conn, SlugTable::Theaters, requested_slug, name).await?;
        sqlx::query(
            "INSERT INTO theaters (name, slug, area, address, image_url, area_tags) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(name)
        .bind(&slug)
        .bind(row.area.as_deref().unwrap_or_default())
        .bind(row.address.as_deref().unwrap_or_default())
        .bind(row.image_url.as_deref().unwrap_or_default())
        .bind(&area_tags)
        .execute(conn)
        .await?;
        Ok(RowOutcome::Created)
    }

    async fn troupe_row(
        conn: &mut PgConnection,
        row: TroupeCsvRow,
    ) -> Result<RowOutcome, RowFailure> {
        let name = row.name.trim();
        if name.is_empty() {
            return Err(invalid("name is required"));
        }
        let image_allowed = parse_bool(row.image_allowed.as_deref()).map_err(invalid)?;
        let requested_slug = non_blank(row.slug.as_deref());

        if let Some(id) = row.id {
            let result = sqlx::query(
                "UPDATE troupes SET \
                    name = $2, slug = COALESCE($3, slug), official_site = $4, image_allowed = $5 \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(name)
            .bind(requested_slug)
            .bind(row.official_site.as_deref().unwrap_or_default())
            .bind(image_allowed)
            .execute(conn)
            .await?;
            return if result.rows_affected() > 0 {
                Ok(RowOutcome::Updated)
            } else {
                Err(invalid(format!("troupe {id} does not exist")))
            };
        }

        let slug = available_slug(&mut *conn, SlugTable::Troupes, requested_slug, name).await?;
        sqlx::query(
            "INSERT INTO troupes (name, slug, official_site, image_allowed) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(name)
        .bind(&slug)
        .bind(row.official_site.as_deref().unwrap_or_default())
        .bind(image_allowed)
        .execute(conn)
        .await?;
        Ok(RowOutcome::Created)
    }

    async fn work_row(conn: &mut PgConnection, row: WorkCsvRow) -> Result<RowOutcome, RowFailure> {
        let title = row.title.trim();
        if title.is_empty() {
            return Err(invalid("title is required"));
        }
        let status = match non_blank(row.status.as_deref()) {
            Some(value) => Some(
                WorkStatus::parse(value)
                    .ok_or_else(|| invalid(format!("unknown status '{value}'")))?,
            ),
            None => None,
        };

        let troupe = Self::resolve_troupe(&mut *conn, row.troupe.as_deref()).await?;
        let theater = Self::resolve_theater(&mut *conn, row.main_theater.as_deref()).await?;
        let actor_ids = Self::resolve_actors(&mut *conn, row.actors.as_deref()).await?;
        let tag_ids = Self::resolve_tags(&mut *conn, row.tags.as_deref()).await?;
        let requested_slug = non_blank(row.slug.as_deref());

        let (work_id, outcome) = match row.id {
            Some(id) => {
                let updated: Option<DbId> = sqlx::query_scalar(
                    "UPDATE works SET \
                        title = $2, slug = COALESCE($3, slug), troupe_id = $4, \
                        main_theater_id = $5, status = COALESCE($6, status) \
                     WHERE id = $1 \
                     RETURNING id",
                )
                .bind(id)
                .bind(title)
                .bind(requested_slug)
                .bind(troupe.as_ref().map(|t| t.id))
                .bind(theater.as_ref().map(|t| t.id))
                .bind(status.map(|s| s.as_str()))
                .fetch_optional(&mut *conn)
                .await?;
                let id = updated.ok_or_else(|| invalid(format!("work {id} does not exist")))?;
                (id, RowOutcome::Updated)
            }
            None => {
                let slug =
                    available_slug(&mut *conn, SlugTable::Works, requested_slug, title).await?;
                let new_work = NewWork {
                    title: title.to_string(),
                    slug,
                    status: status.unwrap_or_default(),
                    troupe_id: troupe.as_ref().map(|t| t.id),
                    main_theater_id: theater.as_ref().map(|t| t.id),
                    ..Default::default()
                };
                let work = WorkRepo::insert(&mut *conn, &new_work).await?;
                (work.id, RowOutcome::Created)
            }
        };

        WorkRepo::replace_actors(&mut *conn, work_id, &actor_ids).await?;
        WorkRepo::replace_tags(conn, work_id, &tag_ids).await?;
        Ok(outcome)
    }

    async fn run_row(conn: &mut PgConnection, row: RunCsvRow) -> Result<RowOutcome, RowFailure> {
        let label = row.label.trim();
        if label.is_empty() {
            return Err(invalid("label is required"));
        }
        let work_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM works WHERE id = $1)")
                .bind(row.work)
                .fetch_one(&mut *conn)
                .await?;
        if !work_exists {
            return Err(invalid(format!("work {} does not exist", row.work)));
        }

        let input = CreateRun {
            work_id: row.work,
            label: label.to_string(),
            area: row.area.unwrap_or_default(),
            theater_id: row.theater,
            start_date: row.start_date,
            end_date: row.end_date,
        };

        if let Some(id) = row.id {
            let result = sqlx::query(
                "UPDATE runs SET \
                    work_id = $2, label = $3, area = $4, theater_id = $5, \
                    start_date = $6, end_date = $7 \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(input.work_id)
            .bind(&input.label)
            .bind(&input.area)
            .bind(input.theater_id)
            .bind(input.start_date)
            .bind(input.end_date)
            .execute(conn)
            .await?;
            return if result.rows_affected() > 0 {
                Ok(RowOutcome::Updated)
            } else {
                Err(invalid(format!("run {id} does not exist")))
            };
        }

        RunRepo::insert(conn, &input).await?;
        Ok(RowOutcome::Created)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    pub async fn export_theaters(pool: &PgPool) -> Result<Vec<TheaterCsvRow>, sqlx::Error> {
        let theaters = sqlx::query_as::<_, Theater>(
            "SELECT id, name, slug, area, address, image_url, area_tags FROM theaters ORDER BY id",
        )
        .fetch_all(pool)
        .await?;

        Ok(theaters
            .into_iter()
            .map(|t| TheaterCsvRow {
                id: Some(t.id),
                area_tags: Some(join_names(&t.area_tags)),
                name: t.name,
                slug: Some(t.slug),
                area: Some(t.area),
                address: Some(t.address),
                image_url: Some(t.image_url),
            })
            .collect())
    }

    pub async fn export_troupes(pool: &PgPool) -> Result<Vec<TroupeCsvRow>, sqlx::Error> {
        let troupes = sqlx::query_as::<_, Troupe>(
            "SELECT id, name, slug, official_site, image_allowed FROM troupes ORDER BY id",
        )
        .fetch_all(pool)
        .await?;

        Ok(troupes
            .into_iter()
            .map(|t| TroupeCsvRow {
                id: Some(t.id),
                name: t.name,
                slug: Some(t.slug),
                official_site: Some(t.official_site),
                image_allowed: Some(t.image_allowed.to_string()),
            })
            .collect())
    }

    pub async fn export_works(pool: &PgPool) -> Result<Vec<WorkCsvRow>, sqlx::Error> {
        let rows: Vec<ExportedWork> = sqlx::query_as(
            "SELECT w.id, w.title, w.slug, t.name, th.name, w.status, \
                ARRAY(SELECT a.name FROM work_actors wa JOIN actors a ON a.id = wa.actor_id \
                      WHERE wa.work_id = w.id ORDER BY a.name), \
                ARRAY(SELECT g.name FROM work_tags wt JOIN tags g ON g.id = wt.tag_id \
                      WHERE wt.work_id = w.id ORDER BY g.name) \
             FROM works w \
             LEFT JOIN troupes t ON t.id = w.troupe_id \
             LEFT JOIN theaters th ON th.id = w.main_theater_id \
             ORDER BY w.id",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, title, slug, troupe, main_theater, status, actors, tags)| WorkCsvRow {
                    id: Some(id),
                    title,
                    slug: Some(slug),
                    troupe,
                    main_theater,
                    actors: Some(join_names(&actors)),
                    status: Some(status),
                    tags: Some(join_names(&tags)),
                },
            )
            .collect())
    }

    pub async fn export_runs(pool: &PgPool) -> Result<Vec<RunCsvRow>, sqlx::Error> {
        let query = format!("SELECT {RUN_COLUMNS} FROM runs ORDER BY id");
        let runs = sqlx::query_as::<_, Run>(&query).fetch_all(pool).await?;

        Ok(runs
            .into_iter()
            .map(|r| RunCsvRow {
                id: Some(r.id),
                work: r.work_id,
                label: r.label,
                area: Some(r.area),
                theater: r.theater_id,
                start_date: r.start_date,
                end_date: r.end_date,
            })
            .collect())
    }
}

/// A parsed CSV record that can be applied inside a transaction.
trait ImportRow {
    async fn apply(self, conn: &mut PgConnection) -> Result<RowOutcome, RowFailure>;
}

impl ImportRow for TheaterCsvRow {
    async fn apply(self, conn: &mut PgConnection) -> Result<RowOutcome, RowFailure> {
        ImportRepo::theater_row(conn, self).await
    }
}

impl ImportRow for TroupeCsvRow {
    async fn apply(self, conn: &mut PgConnection) -> Result<RowOutcome, RowFailure> {
        ImportRepo::troupe_row(conn, self).await
    }
}

impl ImportRow for WorkCsvRow {
    async fn apply(self, conn: &mut PgConnection) -> Result<RowOutcome, RowFailure> {
        ImportRepo::work_row(conn, self).await
    }
}

impl ImportRow for RunCsvRow {
    async fn apply(self, conn: &mut PgConnection) -> Result<RowOutcome, RowFailure> {
        ImportRepo::run_row(conn, self).await
    }
}

/// Apply each row in its own transaction. Parse errors and rejected rows are
/// recorded in the summary; only connection-level failures abort the import.
async fn import_rows<T: ImportRow>(
    pool: &PgPool,
    rows: Vec<ParsedRow<T>>,
) -> Result<ImportSummary, sqlx::Error> {
    let mut summary = ImportSummary::default();
    for parsed in rows {
        let record = match parsed.record {
            Ok(record) => record,
            Err(message) => {
                summary.record_error(parsed.row, message);
                continue;
            }
        };
        let mut tx = pool.begin().await?;
        let outcome = record.apply(&mut tx).await;
        settle(tx, &mut summary, parsed.row, outcome).await?;
    }
    Ok(summary)
}

/// Commit or roll back one row's transaction and record the outcome.
async fn settle(
    tx: Transaction<'_, Postgres>,
    summary: &mut ImportSummary,
    row: usize,
    outcome: Result<RowOutcome, RowFailure>,
) -> Result<(), sqlx::Error> {
    match outcome {
        Ok(RowOutcome::Created) => {
            tx.commit().await?;
            summary.created += 1;
        }
        Ok(RowOutcome::Updated) => {
            tx.commit().await?;
            summary.updated += 1;
        }
        Err(failure) => {
            tx.rollback().await?;
            tracing::warn!(row, error = %failure, "Import row rejected");
            summary.record_error(row, failure.to_string());
        }
    }
    Ok(())
}
