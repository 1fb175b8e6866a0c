//! CSV row shapes and parsing for bulk import/export of catalog data.
//!
//! Cross-reference columns carry names, not ids: `main_theater` and
//! `troupe` hold a single name, `actors` and `tags` hold comma-separated
//! names. Resolving those names to rows happens in the database layer; this
//! module only parses, splits and serializes.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Separator used inside multi-name cells.
pub const NAME_SEPARATOR: char = ',';

#[derive(Debug, thiserror::Error)]
pub enum CsvImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("CSV writer error: {0}")]
    Flush(String),

    #[error("Unknown import resource '{0}'")]
    UnknownResource(String),
}

/// Catalog tables that support bulk import and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvResource {
    Theaters,
    Troupes,
    Works,
    Runs,
}

impl CsvResource {
    pub fn parse(value: &str) -> Result<Self, CsvImportError> {
        match value {
            "theaters" => Ok(CsvResource::Theaters),
            "troupes" => Ok(CsvResource::Troupes),
            "works" => Ok(CsvResource::Works),
            "runs" => Ok(CsvResource::Runs),
            other => Err(CsvImportError::UnknownResource(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CsvResource::Theaters => "theaters",
            CsvResource::Troupes => "troupes",
            CsvResource::Works => "works",
            CsvResource::Runs => "runs",
        }
    }
}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TheaterCsvRow {
    pub id: Option<DbId>,
    pub name: String,
    pub slug: Option<String>,
    pub area: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
    /// Comma-separated area tags.
    pub area_tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TroupeCsvRow {
    pub id: Option<DbId>,
    pub name: String,
    pub slug: Option<String>,
    pub official_site: Option<String>,
    /// `true`/`false`, `1`/`0` or `yes`/`no`. Blank means `false`.
    pub image_allowed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkCsvRow {
    pub id: Option<DbId>,
    pub title: String,
    pub slug: Option<String>,
    /// Troupe name.
    pub troupe: Option<String>,
    /// Theater name.
    pub main_theater: Option<String>,
    /// Comma-separated actor names.
    pub actors: Option<String>,
    pub status: Option<String>,
    /// Comma-separated tag names.
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCsvRow {
    pub id: Option<DbId>,
    /// Work id.
    pub work: DbId,
    pub label: String,
    pub area: Option<String>,
    /// Theater id.
    pub theater: Option<DbId>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

// ---------------------------------------------------------------------------
// Import report
// ---------------------------------------------------------------------------

/// A row that could not be imported. `row` is the 1-based line number in
/// the file, counting the header as line 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of one import request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<RowError>,
}

impl ImportSummary {
    pub fn record_error(&mut self, row: usize, message: impl Into<String>) {
        self.errors.push(RowError {
            row,
            message: message.into(),
        });
    }
}

/// One parsed data row: its line number and either the record or the
/// reason it could not be read.
#[derive(Debug)]
pub struct ParsedRow<T> {
    pub row: usize,
    pub record: Result<T, String>,
}

// ---------------------------------------------------------------------------
// Parsing / writing
// ---------------------------------------------------------------------------

/// Parse a CSV document with a header row into typed records.
///
/// Malformed rows do not abort parsing; each is returned with its error so
/// the caller can report it and continue with the rest.
pub fn parse_rows<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<ParsedRow<T>>, CsvImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    // Surface a broken header as a whole-file error.
    rdr.headers()?;

    let rows = rdr
        .deserialize::<T>()
        .enumerate()
        .map(|(idx, result)| ParsedRow {
            row: idx + 2,
            record: result.map_err(|e| format!("CSV parse error: {e}")),
        })
        .collect();

    Ok(rows)
}

/// Serialize records into a CSV document with a header row.
pub fn write_rows<T: Serialize>(rows: &[T]) -> Result<String, CsvImportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| CsvImportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Split a multi-name cell into trimmed, non-empty, de-duplicated names in
/// first-seen order. A missing or blank cell yields no names.
pub fn split_names(cell: Option<&str>) -> Vec<String> {
    let Some(cell) = cell else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    cell.split(NAME_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// Join names for a multi-name cell.
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Treat a blank optional cell as absent.
pub fn non_blank(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a boolean cell. Blank is `false`; unknown text is an error.
pub fn parse_bool(cell: Option<&str>) -> Result<bool, String> {
    match non_blank(cell).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "y") => Ok(true),
        Some("0" | "false" | "no" | "n") => Ok(false),
        Some(other) => Err(format!("'{other}' is not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn split_names_dedups_and_trims() {
        assert_eq!(split_names(Some("A, B, B")), vec!["A", "B"]);
        assert_eq!(split_names(Some(" A ,, ,B")), vec!["A", "B"]);
    }

    #[test]
    fn split_names_blank_is_empty() {
        assert!(split_names(None).is_empty());
        assert!(split_names(Some("")).is_empty());
        assert!(split_names(Some(" , ")).is_empty());
    }

    #[test]
    fn parse_bool_variants() {
        assert_eq!(parse_bool(None), Ok(false));
        assert_eq!(parse_bool(Some("")), Ok(false));
        assert_eq!(parse_bool(Some("1")), Ok(true));
        assert_eq!(parse_bool(Some("TRUE")), Ok(true));
        assert_eq!(parse_bool(Some("no")), Ok(false));
        assert!(parse_bool(Some("maybe")).is_err());
    }

    #[test]
    fn parse_work_rows_with_blank_cells() {
        let csv = "id,title,slug,troupe,main_theater,actors,status,tags\n\
                   ,Hamlet,,Globe Players,,\"A, B, B\",APPROVED,\n\
                   7,Macbeth,macbeth,,Globe,,,tragedy\n";
        let rows = parse_rows::<WorkCsvRow>(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = rows[0].record.as_ref().unwrap();
        assert_eq!(rows[0].row, 2);
        assert_eq!(first.id, None);
        assert_eq!(first.title, "Hamlet");
        assert_eq!(first.main_theater, None);
        assert_eq!(split_names(first.actors.as_deref()), vec!["A", "B"]);

        let second = rows[1].record.as_ref().unwrap();
        assert_eq!(second.id, Some(7));
        assert_eq!(second.main_theater.as_deref(), Some("Globe"));
    }

    #[test]
    fn malformed_row_is_reported_not_fatal() {
        let csv = "id,work,label,area,theater,start_date,end_date\n\
                   ,abc,Tokyo,,,,\n\
                   ,3,Osaka,Kansai,,2024-05-01,2024-05-10\n";
        let rows = parse_rows::<RunCsvRow>(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].record.is_err());
        let run = rows[1].record.as_ref().unwrap();
        assert_eq!(run.work, 3);
        assert_eq!(
            run.start_date,
            Some(chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
    }

    #[test]
    fn write_rows_emits_header() {
        let rows = vec![TroupeCsvRow {
            id: Some(1),
            name: "Globe Players".into(),
            slug: Some("globe-players".into()),
            official_site: None,
            image_allowed: Some("true".into()),
        }];
        let out = write_rows(&rows).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("id,name,slug,official_site,image_allowed")
        );
        assert_eq!(lines.next(), Some("1,Globe Players,globe-players,,true"));
    }

    #[test]
    fn unknown_resource_is_rejected() {
        assert_matches!(CsvResource::parse("works"), Ok(CsvResource::Works));
        assert_matches!(
            CsvResource::parse("users"),
            Err(CsvImportError::UnknownResource(r)) if r == "users"
        );
    }

    #[test]
    fn join_names_uses_comma_space() {
        assert_eq!(join_names(&["A", "B"]), "A, B");
        assert_eq!(join_names::<&str>(&[]), "");
    }
}
