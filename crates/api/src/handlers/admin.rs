//! Admin-only bulk CSV export and import of catalog tables.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use hoshidori_core::csv_import::{parse_rows, write_rows, CsvResource, ImportSummary};
use hoshidori_db::repositories::ImportRepo;

use crate::error::AppResult;
use crate::extract::Json;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// GET /api/v1/admin/export/{resource}
///
/// `resource` is one of `theaters`, `troupes`, `works`, `runs`.
pub async fn export(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(resource): Path<String>,
) -> AppResult<impl IntoResponse> {
    let resource = CsvResource::parse(&resource)?;

    let csv = match resource {
        CsvResource::Theaters => write_rows(&ImportRepo::export_theaters(&state.pool).await?)?,
        CsvResource::Troupes => write_rows(&ImportRepo::export_troupes(&state.pool).await?)?,
        CsvResource::Works => write_rows(&ImportRepo::export_works(&state.pool).await?)?,
        CsvResource::Runs => write_rows(&ImportRepo::export_runs(&state.pool).await?)?,
    };
    tracing::info!(resource = resource.as_str(), user_id = admin.user_id, "CSV export");

    let disposition = format!("attachment; filename=\"{}.csv\"", resource.as_str());
    Ok((
        [(CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()), (CONTENT_DISPOSITION, disposition)],
        csv,
    ))
}

/// POST /api/v1/admin/import/{resource}
///
/// The body is a CSV document with a header row. Rows with a non-empty `id`
/// update that row, other rows are created. Row failures are reported and
/// never abort the remaining rows.
pub async fn import(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(resource): Path<String>,
    body: Bytes,
) -> AppResult<Json<ImportSummary>> {
    let resource = CsvResource::parse(&resource)?;

    let pool = &state.pool;
    let summary = match resource {
        CsvResource::Theaters => ImportRepo::import_theaters(pool, parse_rows(&body)?).await?,
        CsvResource::Troupes => ImportRepo::import_troupes(pool, parse_rows(&body)?).await?,
        CsvResource::Works => ImportRepo::import_works(pool, parse_rows(&body)?).await?,
        CsvResource::Runs => ImportRepo::import_runs(pool, parse_rows(&body)?).await?,
    };
    tracing::info!(
        resource = resource.as_str(),
        user_id = admin.user_id,
        created = summary.created,
        updated = summary.updated,
        errors = summary.errors.len(),
        "CSV import finished"
    );

    Ok(Json(summary))
}
