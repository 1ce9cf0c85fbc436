//! Category: top-level grouping of items.

use crate::model::entity::{text, Entity, EntityMeta};
use crate::query::SortField;
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Unique among live categories.
    pub name: String,
    pub description: String,
    /// Display attribute rendered around items of this category.
    pub display_color: String,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        display_color: impl Into<String>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(),
            name: name.into(),
            description: description.into(),
            display_color: display_color.into(),
        }
    }
}

impl Entity for Category {
    const NAME: &'static str = "category";
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &["name", "description", "display_color"];
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("name", "name"),
        SortField::new("description", "description"),
        SortField::new("display_color", "display_color"),
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
            text(&self.display_color),
        ])
    }

    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            name: row.get("name")?,
            description: row.get("description")?,
            display_color: row.get("display_color")?,
        })
    }
}
