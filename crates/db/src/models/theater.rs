//! Theater model and DTOs.

use hoshidori_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validators::{blank_or_url, not_blank};

/// A row from the `theaters` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Theater {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    /// Main area, e.g. "Tokyo".
    pub area: String,
    pub address: String,
    pub image_url: String,
    /// Free-form area labels, e.g. `["Shinjuku", "small venue"]`.
    pub area_tags: Vec<String>,
}

/// DTO for creating a theater. A blank `slug` is derived from `name`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTheater {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 100))]
    pub area: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub image_url: Option<String>,
    pub area_tags: Option<Vec<String>>,
}

/// DTO for updating a theater. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTheater {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub slug: Option<String>,
    #[validate(length(max = 100))]
    pub area: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub image_url: Option<String>,
    pub area_tags: Option<Vec<String>>,
}

/// Query parameters for `GET /theaters`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TheaterListParams {
    /// Matches name, area or any area tag.
    pub search: Option<String>,
}
