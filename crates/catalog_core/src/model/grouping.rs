//! Grouping: a course module holding sub-units.
//!
//! # Invariants
//! - `core_capacity <= total_capacity` (also enforced by a table CHECK).

use crate::model::entity::{text, Entity, EntityMeta};
use crate::query::SortField;
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Unique among live groupings.
    pub name: String,
    pub description: String,
    /// Slots reserved for mandatory sub-units.
    pub core_capacity: i32,
    pub total_capacity: i32,
}

impl Grouping {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        core_capacity: i32,
        total_capacity: i32,
    ) -> Self {
        Self {
            meta: EntityMeta::new(),
            name: name.into(),
            description: description.into(),
            core_capacity,
            total_capacity,
        }
    }
}

impl Entity for Grouping {
    const NAME: &'static str = "grouping";
    const TABLE: &'static str = "groupings";
    const COLUMNS: &'static [&'static str] =
        &["name", "description", "core_capacity", "total_capacity"];
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("name", "name"),
        SortField::new("description", "description"),
        SortField::new("core_capacity", "core_capacity"),
        SortField::new("total_capacity", "total_capacity"),
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
            Value::Integer(i64::from(self.core_capacity)),
            Value::Integer(i64::from(self.total_capacity)),
        ])
    }

    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            name: row.get("name")?,
            description: row.get("description")?,
            core_capacity: row.get("core_capacity")?,
            total_capacity: row.get("total_capacity")?,
        })
    }
}
