//! Query specification: paging, sort-field resolution, bulk filters.
//!
//! # Responsibility
//! - Normalize raw paging input into a valid page/size pair.
//! - Resolve runtime sort-field names against an entity's registered
//!   descriptor table, producing a sort key typed to that entity.
//! - Describe bulk-update predicates over an entity's columns.
//!
//! # Invariants
//! - Page is at least 1; size is in `1..=MAX_PAGE_SIZE`.
//! - An unknown sort field is rejected; it is never silently ignored.
//! - Only columns named in an entity's descriptor ever reach SQL text.

mod fields;
mod filter;
mod page;
mod spec;

pub use fields::{resolve_sort_field, validate_sort_fields, SortDirection, SortField, SortKey};
pub use filter::{Condition, Filter};
pub use page::Page;
pub use spec::{
    QueryError, QueryOptions, QuerySpec, ResolvedQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
