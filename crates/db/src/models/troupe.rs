//! Troupe (producing company) model and DTOs.

use hoshidori_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validators::{blank_or_url, not_blank};

/// A row from the `troupes` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Troupe {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub official_site: String,
    /// Whether poster images of this troupe's works may be displayed.
    pub image_allowed: bool,
}

/// DTO for creating a troupe. A blank `slug` is derived from `name`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTroupe {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_site: Option<String>,
    pub image_allowed: Option<bool>,
}

/// DTO for updating a troupe. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTroupe {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub slug: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub official_site: Option<String>,
    pub image_allowed: Option<bool>,
}

/// Query parameters for `GET /troupes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TroupeListParams {
    /// Matches name or slug.
    pub search: Option<String>,
}
