//! Actor model and DTOs.

use hoshidori_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validators::not_blank;

/// A row from the `actors` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Actor {
    pub id: DbId,
    pub name: String,
}

/// DTO for creating an actor. Creation is idempotent by name.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateActor {
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub name: String,
}

/// DTO for renaming an actor.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateActor {
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub name: Option<String>,
}

/// Query parameters for `GET /actors`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActorListParams {
    pub search: Option<String>,
}
