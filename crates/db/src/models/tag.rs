//! Tag model shared by works and viewing logs.

use hoshidori_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// `{value, label}` pair consumed by tag pickers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagOption {
    pub value: String,
    pub label: String,
}

impl From<Tag> for TagOption {
    fn from(tag: Tag) -> Self {
        Self {
            value: tag.name.clone(),
            label: tag.name,
        }
    }
}
