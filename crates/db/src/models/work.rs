//! Work (stage production) model, write DTOs and enriched read shapes.

use chrono::NaiveDate;
use hoshidori_core::types::{DbId, Timestamp};
use hoshidori_core::work_status::WorkStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::actor::Actor;
use super::run::RunDetail;
use super::theater::Theater;
use super::patch::nullable;
use super::troupe::Troupe;
use super::validators::{blank_or_url, not_blank};

/// A row from the `works` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Work {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub is_quick_created: bool,
    pub troupe_id: Option<DbId>,
    pub description: String,
    /// Path of an uploaded poster under the media root.
    pub main_image: Option<String>,
    pub main_theater_id: Option<DbId>,
    pub status: String,
    pub admin_note: String,
    /// Externally hosted poster image.
    pub main_image_url: String,
    pub official_site: String,
    pub official_x: String,
    pub official_instagram: String,
    pub official_tiktok: String,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Work {
    /// Uploaded image when present, otherwise the external URL.
    pub fn display_image(&self) -> Option<String> {
        self.main_image
            .clone()
            .filter(|path| !path.is_empty())
            .or_else(|| Some(self.main_image_url.clone()).filter(|url| !url.is_empty()))
    }
}

/// Body of `POST /works`. New works start as PENDING.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateWork {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub title: String,
    /// Blank means "derive from the title".
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub troupe_id: Option<DbId>,
    pub main_theater_id: Option<DbId>,
    #[validate(custom(function = "blank_or_url"))]
    pub main_image_url: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_site: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_x: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_instagram: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_tiktok: Option<String>,
    #[serde(default)]
    pub is_quick_created: bool,
    /// Tag names; each must already exist.
    pub tags: Option<Vec<String>>,
    /// Actor ids.
    pub actors: Option<Vec<DbId>>,
}

/// Body of `PUT`/`PATCH /works/{id}`. Only non-`None` fields are applied;
/// the troupe and main theater are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWork {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub troupe_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "nullable")]
    pub main_theater_id: Option<Option<DbId>>,
    #[validate(custom(function = "blank_or_url"))]
    pub main_image_url: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_site: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_x: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_instagram: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_tiktok: Option<String>,
    /// Admin only; rejected for other callers by the handler.
    pub status: Option<WorkStatus>,
    pub admin_note: Option<String>,
    pub tags: Option<Vec<String>>,
    pub actors: Option<Vec<DbId>>,
}

/// Body of `POST /works/create_or_get`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateOrGetWork {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub title: String,
    /// Troupe name, resolved or created.
    #[validate(length(max = 200))]
    pub troupe: Option<String>,
    pub main_theater_id: Option<DbId>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_site: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_x: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_instagram: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_tiktok: Option<String>,
    #[validate(length(max = 200))]
    pub run_label: Option<String>,
    #[validate(length(max = 100))]
    pub run_area: Option<String>,
    pub run_theater_id: Option<DbId>,
    pub run_start_date: Option<NaiveDate>,
    pub run_end_date: Option<NaiveDate>,
}

/// Column values for a fresh `works` row, shared by every insert path.
#[derive(Debug, Clone, Default)]
pub struct NewWork {
    pub title: String,
    pub slug: String,
    pub status: WorkStatus,
    pub is_quick_created: bool,
    pub description: String,
    pub troupe_id: Option<DbId>,
    pub main_theater_id: Option<DbId>,
    pub main_image_url: String,
    pub official_site: String,
    pub official_x: String,
    pub official_instagram: String,
    pub official_tiktok: String,
    pub created_by: Option<DbId>,
}

/// Query parameters for `GET /works`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkListParams {
    pub status: Option<String>,
    pub main_theater: Option<DbId>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// List representation of a work.
#[derive(Debug, Clone, Serialize)]
pub struct WorkSummary {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub troupe: Option<Troupe>,
    pub main_theater: Option<Theater>,
    pub status: String,
    pub main_image: Option<String>,
    pub tags: Vec<String>,
    pub avg_rating: Option<f64>,
    pub official_site: String,
    pub official_x: String,
    pub official_instagram: String,
    pub official_tiktok: String,
    pub created_at: Timestamp,
}

/// Detail representation: the list shape plus actors, runs and counts.
#[derive(Debug, Clone, Serialize)]
pub struct WorkDetail {
    #[serde(flatten)]
    pub summary: WorkSummary,
    pub description: String,
    pub is_quick_created: bool,
    pub actors: Vec<Actor>,
    pub runs: Vec<RunDetail>,
    pub comment_count: i64,
    pub created_by: Option<DbId>,
    pub updated_at: Timestamp,
}
