//! Slug allocation for tables with a `uq_<table>_slug` constraint.

use hoshidori_core::slug::{slug_or_random, with_random_suffix};
use sqlx::PgConnection;

/// Tables that carry a unique `slug` column.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SlugTable {
    Theaters,
    Troupes,
    Works,
}

impl SlugTable {
    fn name(self) -> &'static str {
        match self {
            SlugTable::Theaters => "theaters",
            SlugTable::Troupes => "troupes",
            SlugTable::Works => "works",
        }
    }
}

/// Pick a slug for a new row: `requested` when non-blank, else derived from
/// `source`. A taken slug gets a random suffix.
pub(crate) async fn available_slug(
    conn: &mut PgConnection,
    table: SlugTable,
    requested: Option<&str>,
    source: &str,
) -> Result<String, sqlx::Error> {
    let base = match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug.to_string(),
        None => slug_or_random(source),
    };

    let query = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE slug = $1)",
        table.name()
    );
    let taken: bool = sqlx::query_scalar(&query)
        .bind(&base)
        .fetch_one(&mut *conn)
        .await?;

    Ok(if taken { with_random_suffix(&base) } else { base })
}
