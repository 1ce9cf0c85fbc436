//! Item: a catalog entry that belongs to one category.
//!
//! # Invariants
//! - `category_id` must reference a live category whenever the item is
//!   created or updated. Soft-deleting the category cascades to its items.

use crate::model::category::Category;
use crate::model::entity::{read_uuid, text, Entity, EntityId, EntityMeta, NestedEntity};
use crate::query::SortField;
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Unique among live items.
    pub name: String,
    pub description: String,
    /// Location of the item's image or other media asset.
    pub media_ref: String,
    pub category_id: EntityId,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        media_ref: impl Into<String>,
        category_id: EntityId,
    ) -> Self {
        Self {
            meta: EntityMeta::new(),
            name: name.into(),
            description: description.into(),
            media_ref: media_ref.into(),
            category_id,
        }
    }
}

/// An item with its category loaded in the same read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDetail {
    pub item: Item,
    /// `None` once the category has been soft-deleted.
    pub category: Option<Category>,
}

impl Entity for Item {
    const NAME: &'static str = "item";
    const TABLE: &'static str = "items";
    const COLUMNS: &'static [&'static str] = &["name", "description", "media_ref", "category_id"];
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("name", "name"),
        SortField::new("description", "description"),
        SortField::new("media_ref", "media_ref"),
        SortField::new("category_id", "category_id"),
        SortField::new("created_at", "created_at"),
        SortField::new("updated_at", "updated_at"),
        SortField::new("is_deleted", "is_deleted"),
    ];

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn column_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            text(&self.name),
            text(&self.description),
            text(&self.media_ref),
            Value::Text(self.category_id.to_string()),
        ])
    }

    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            name: row.get("name")?,
            description: row.get("description")?,
            media_ref: row.get("media_ref")?,
            category_id: read_uuid(row, Self::TABLE, "category_id")?,
        })
    }
}

impl NestedEntity for Item {
    type Detail = ItemDetail;
}
