//! Paging/sorting input and its normalization.

use crate::model::entity::Entity;
use crate::query::fields::{sort_key, SortDirection, SortKey};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Page size used when the caller passes a non-positive size.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page a caller may request; larger sizes are clamped.
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    UnknownSortField {
        entity: &'static str,
        field: String,
    },
    /// An entity's descriptor table is inconsistent with its columns.
    InvalidSortTable {
        entity: &'static str,
        message: String,
    },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSortField { entity, field } => {
                write!(f, "cannot sort {entity} by unknown field `{field}`")
            }
            Self::InvalidSortTable { entity, message } => {
                write!(f, "invalid sort fields for {entity}: {message}")
            }
        }
    }
}

impl Error for QueryError {}

/// Options-object form of a query, as deserialized from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub order_by: Option<String>,
    pub ascending: Option<bool>,
}

/// Normalized paging and optional sort request, not yet bound to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    page: u32,
    size: u32,
    sort_field: Option<String>,
    ascending: Option<bool>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self::paged(1, i64::from(DEFAULT_PAGE_SIZE))
    }
}

impl QuerySpec {
    /// Builds a query from raw primitives.
    ///
    /// Page below 1 becomes 1; size at or below 0 becomes
    /// [`DEFAULT_PAGE_SIZE`]; size above [`MAX_PAGE_SIZE`] is clamped. A blank
    /// sort field counts as no sort.
    pub fn new(page: i64, size: i64, sort_field: Option<&str>, ascending: Option<bool>) -> Self {
        let sort_field = sort_field
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self {
            page: normalize_page(page),
            size: normalize_size(size),
            sort_field,
            ascending,
        }
    }

    /// Unsorted query for one page.
    pub fn paged(page: i64, size: i64) -> Self {
        Self::new(page, size, None, None)
    }

    /// Builds a query from an options value; absent page/size use defaults.
    pub fn from_options(options: &QueryOptions) -> Self {
        Self::new(
            options.page.unwrap_or(1),
            options.size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
            options.order_by.as_deref(),
            options.ascending,
        )
    }

    /// Returns a copy sorted by `field`.
    pub fn sorted_by(mut self, field: &str, ascending: bool) -> Self {
        self.sort_field = Some(field.trim().to_string()).filter(|value| !value.is_empty());
        self.ascending = Some(ascending);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref()
    }

    pub fn ascending(&self) -> Option<bool> {
        self.ascending
    }

    /// Binds the query to entity `T`, resolving its sort field.
    ///
    /// A present sort field without a direction sorts ascending.
    pub fn resolve<T: Entity>(&self) -> Result<ResolvedQuery<T>, QueryError> {
        let sort = match self.sort_field.as_deref() {
            Some(field) => Some(sort_key::<T>(
                field,
                SortDirection::from_ascending(self.ascending.unwrap_or(true)),
            )?),
            None => None,
        };
        Ok(ResolvedQuery {
            page: self.page,
            size: self.size,
            sort,
        })
    }
}

/// A query bound to one entity type, ready for SQL generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery<T> {
    pub page: u32,
    pub size: u32,
    pub sort: Option<SortKey<T>>,
}

impl<T> ResolvedQuery<T> {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// `ORDER BY` body; unsorted queries fall back to creation order.
    pub(crate) fn order_by_sql(&self) -> String {
        match &self.sort {
            Some(key) => key.order_by_sql(),
            None => "created_at ASC, id ASC".to_string(),
        }
    }
}

fn normalize_page(page: i64) -> u32 {
    if page < 1 {
        1
    } else {
        u32::try_from(page).unwrap_or(u32::MAX)
    }
}

fn normalize_size(size: i64) -> u32 {
    if size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        u32::try_from(size).map_or(MAX_PAGE_SIZE, |value| value.min(MAX_PAGE_SIZE))
    }
}
