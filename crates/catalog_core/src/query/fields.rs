//! Sort-field descriptor tables and typed sort keys.

use crate::model::entity::{Entity, META_COLUMNS};
use crate::query::QueryError;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// One sortable field of an entity: the caller-facing name and its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

impl SortField {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A sort field resolved for entity `T`.
///
/// The type parameter keeps a key resolved for one entity from being used to
/// order another entity's rows.
pub struct SortKey<T> {
    field: &'static SortField,
    direction: SortDirection,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SortKey<T> {
    pub fn field_name(&self) -> &'static str {
        self.field.name
    }

    pub fn column(&self) -> &'static str {
        self.field.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// `ORDER BY` body with `id` as a deterministic tie-break.
    pub(crate) fn order_by_sql(&self) -> String {
        if self.field.column == "id" {
            format!("id {}", self.direction.as_sql())
        } else {
            format!("{} {}, id ASC", self.field.column, self.direction.as_sql())
        }
    }
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SortKey<T> {}

impl<T> PartialEq for SortKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.direction == other.direction
    }
}

impl<T> Debug for SortKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortKey")
            .field("field", &self.field.name)
            .field("direction", &self.direction)
            .finish()
    }
}

/// Looks up `name` in `T`'s descriptor table, ignoring ASCII case.
pub fn resolve_sort_field<T: Entity>(name: &str) -> Option<&'static SortField> {
    let name = name.trim();
    T::SORT_FIELDS
        .iter()
        .find(|field| field.name.eq_ignore_ascii_case(name))
}

pub(crate) fn sort_key<T: Entity>(
    name: &str,
    direction: SortDirection,
) -> Result<SortKey<T>, QueryError> {
    let field = resolve_sort_field::<T>(name).ok_or_else(|| QueryError::UnknownSortField {
        entity: T::NAME,
        field: name.trim().to_string(),
    })?;
    Ok(SortKey {
        field,
        direction,
        _entity: PhantomData,
    })
}

/// Checks `T`'s descriptor table: every field names a real sortable column, no
/// two fields collide case-insensitively, and every column outside
/// `T::UNSORTABLE_COLUMNS` has a field.
pub fn validate_sort_fields<T: Entity>() -> Result<(), QueryError> {
    let mut seen = HashSet::new();
    for field in T::SORT_FIELDS {
        if !T::has_column(field.column) || T::UNSORTABLE_COLUMNS.contains(&field.column) {
            return Err(QueryError::InvalidSortTable {
                entity: T::NAME,
                message: format!(
                    "field `{}` points at unknown column `{}`",
                    field.name, field.column
                ),
            });
        }
        if !seen.insert(field.name.to_ascii_lowercase()) {
            return Err(QueryError::InvalidSortTable {
                entity: T::NAME,
                message: format!("field `{}` is registered twice", field.name),
            });
        }
    }

    let uncovered = META_COLUMNS
        .iter()
        .chain(T::COLUMNS)
        .copied()
        .filter(|column| !T::UNSORTABLE_COLUMNS.contains(column))
        .find(|column| !T::SORT_FIELDS.iter().any(|field| field.column == *column));
    if let Some(column) = uncovered {
        return Err(QueryError::InvalidSortTable {
            entity: T::NAME,
            message: format!("column `{column}` has no sort field"),
        });
    }
    Ok(())
}
