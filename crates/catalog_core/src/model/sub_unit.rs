//! Sub-unit: a lesson inside a grouping that references catalog items.
//!
//! # Invariants
//! - `grouping_id` must reference a live grouping at create/update time.
//! - Every id in `item_ids` must resolve to a live item at create/update time.
//! - `item_ids` is stored de-duplicated, in first-seen order.

use crate::model::entity::{read_uuid, text, Entity, EntityId, EntityMeta, NestedEntity};
use crate::model::grouping::Grouping;
use crate::model::item::Item;
use crate::query::SortField;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubUnit {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    /// Lesson body.
    pub content: String,
    /// Audience tag, e.g. the school year the lesson targets.
    pub classification: String,
    pub grouping_id: EntityId,
    pub item_ids: Vec<EntityId>,
}

impl SubUnit {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        classification: impl Into<String>,
        grouping_id: EntityId,
        item_ids: impl IntoIterator<Item = EntityId>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(),
            name: name.into(),
            content: content.into(),
            classification: classification.into(),
            grouping_id,
            item_ids: dedup_ids(item_ids),
        }
    }
}

/// A sub-unit with its grouping and live items loaded in the same read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubUnitDetail {
    pub sub_unit: SubUnit,
    /// `None` once the grouping has been soft-deleted.
    pub grouping: Option<Grouping>,
    /// Live items in `item_ids` order; soft-deleted items are omitted.
    pub items: Vec<Item>,
}

/// Removes repeated ids, keeping the first occurrence of each.
pub fn dedup_ids(ids: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

impl Entity for SubUnit {
    const NAME: &'static str = "sub_unit";
    const TABLE: &'static str = "sub_units";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "content",
        "classification",
        "grouping_id",
        "item_ids",
    ];
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("name", "name"),
        SortField::new("content", "content"),
        SortField::new("classification", "classification"),
        SortField::new("grouping_id", "grouping_id"),
        SortField::new("created_at", "created_at"),
        SortField::new("updated_at", "updated_at"),
        SortField::new("is_deleted", "is_deleted"),
    ];
    /// `item_ids` is a JSON array.
    const UNSORTABLE_COLUMNS: &'static [&'static str] = &["item_ids"];

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn column_values(&self) -> RepoResult<Vec<Value>> {
        let item_ids = serde_json::to_string(&dedup_ids(self.item_ids.iter().copied()))
            .map_err(|err| RepoError::InvalidData(format!("cannot encode item_ids: {err}")))?;
        Ok(vec![
            text(&self.name),
            text(&self.content),
            text(&self.classification),
            Value::Text(self.grouping_id.to_string()),
            Value::Text(item_ids),
        ])
    }

    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self> {
        let raw_item_ids: String = row.get("item_ids")?;
        let item_ids: Vec<EntityId> = serde_json::from_str(&raw_item_ids).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid item id list `{raw_item_ids}` in sub_units.item_ids: {err}"
            ))
        })?;

        Ok(Self {
            meta,
            name: row.get("name")?,
            content: row.get("content")?,
            classification: row.get("classification")?,
            grouping_id: read_uuid(row, Self::TABLE, "grouping_id")?,
            item_ids,
        })
    }
}

impl NestedEntity for SubUnit {
    type Detail = SubUnitDetail;
}
