//! Entity contract shared by every stored type.
//!
//! # Responsibility
//! - Carry identity, timestamps and the soft-delete flag (`EntityMeta`).
//! - Describe how a type maps onto its table so one generic repository can
//!   persist, filter and sort any entity without per-type SQL.
//!
//! # Invariants
//! - `COLUMNS` lists data columns only; the metadata columns in
//!   [`META_COLUMNS`] are handled by the repository.
//! - `column_values` returns values in exactly the order of `COLUMNS`.
//! - `SORT_FIELDS` covers every metadata and data column except
//!   `UNSORTABLE_COLUMNS`.
//! - A flagged entity (`is_deleted = true`) is logically gone.

use crate::query::SortField;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of every stored entity.
pub type EntityId = Uuid;

/// Columns every entity table carries, in select order.
pub const META_COLUMNS: [&str; 4] = ["id", "created_at", "updated_at", "is_deleted"];

/// Identity, lifecycle timestamps and tombstone flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub id: EntityId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds; bumped by every update and soft delete.
    pub updated_at: i64,
    pub is_deleted: bool,
}

impl EntityMeta {
    /// Fresh live metadata with a generated id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Fresh live metadata with a caller-provided id.
    pub fn with_id(id: EntityId) -> Self {
        let now = now_epoch_ms();
        Self {
            id,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    /// Resets to a live row created now; the id is kept.
    pub fn mark_created(&mut self) {
        let now = now_epoch_ms();
        self.created_at = now;
        self.updated_at = now;
        self.is_deleted = false;
    }

    /// Bumps `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Table descriptor and row codec for a storable type.
pub trait Entity: Clone + 'static {
    /// Human-readable name used in errors and log events.
    const NAME: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Fields a caller may sort by, matched case-insensitively. Every column
    /// outside `UNSORTABLE_COLUMNS` has an entry.
    const SORT_FIELDS: &'static [SortField];
    /// Columns with no meaningful order, such as JSON-encoded lists.
    const UNSORTABLE_COLUMNS: &'static [&'static str] = &[];

    fn meta(&self) -> &EntityMeta;
    fn meta_mut(&mut self) -> &mut EntityMeta;
    fn column_values(&self) -> RepoResult<Vec<Value>>;
    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self>;

    fn id(&self) -> EntityId {
        self.meta().id
    }

    /// True when `column` is a metadata or data column of this table.
    fn has_column(column: &str) -> bool {
        META_COLUMNS.contains(&column) || Self::COLUMNS.contains(&column)
    }
}

/// An entity with a specialized repository that eager-loads relations.
pub trait NestedEntity: Entity {
    /// The entity together with its loaded relations.
    type Detail: Clone + 'static;
}

pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Decodes the metadata columns of one row.
pub(crate) fn read_meta(row: &Row<'_>, table: &'static str) -> RepoResult<EntityMeta> {
    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in {table}.is_deleted"
            )));
        }
    };

    Ok(EntityMeta {
        id: read_uuid(row, table, "id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_deleted,
    })
}

pub(crate) fn read_uuid(
    row: &Row<'_>,
    table: &'static str,
    column: &'static str,
) -> RepoResult<EntityId> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::EntityMeta;

    #[test]
    fn new_meta_is_live_with_equal_timestamps() {
        let meta = EntityMeta::new();
        assert!(meta.is_active());
        assert_eq!(meta.created_at, meta.updated_at);
    }

    #[test]
    fn mark_created_clears_flag_and_restamps() {
        let mut meta = EntityMeta::new();
        let id = meta.id;
        meta.created_at = 1;
        meta.updated_at = 2;
        meta.is_deleted = true;

        meta.mark_created();
        assert!(meta.is_active());
        assert_eq!(meta.id, id);
        assert!(meta.created_at > 2);
        assert_eq!(meta.created_at, meta.updated_at);
    }

    #[test]
    fn touch_never_moves_updated_at_backwards() {
        let mut meta = EntityMeta::new();
        meta.updated_at = i64::MAX - 1;
        meta.touch();
        assert_eq!(meta.updated_at, i64::MAX - 1);
    }
}
