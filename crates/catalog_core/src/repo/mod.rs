//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the generic repository contract every entity gets for free.
//! - Define the eager-loading contract of specialized repositories.
//! - Own the storage session and its single write transaction (unit of work).
//!
//! # Invariants
//! - Every read takes its inactive-visibility explicitly.
//! - Writes are staged in the scope's transaction and never committed by a
//!   repository; only `UnitOfWork::save_changes` commits.
//! - Repository-level absence is `Option`/`bool`, not an error.

use crate::db::DbError;
use crate::model::entity::{Entity, EntityId, NestedEntity};
use crate::query::{Filter, Page, QueryError, QuerySpec};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Implements `Repository<$entity>` for a specialized repository by forwarding
/// to its inner `GenericRepository` field.
///
/// ```ignore
/// catalog_core::delegate_repository!(BadgeRepository, Badge, badges);
/// ```
#[macro_export]
macro_rules! delegate_repository {
    ($repo:ty, $entity:ty, $inner:ident) => {
        impl $crate::repo::Repository<$entity> for $repo {
            fn get_by_id(
                &self,
                id: $crate::model::entity::EntityId,
                include_inactive: bool,
            ) -> $crate::repo::RepoResult<Option<$entity>> {
                $crate::repo::Repository::get_by_id(&self.$inner, id, include_inactive)
            }

            fn is_exist(
                &self,
                id: $crate::model::entity::EntityId,
            ) -> $crate::repo::RepoResult<bool> {
                $crate::repo::Repository::is_exist(&self.$inner, id)
            }

            fn count_exist(
                &self,
                ids: &[$crate::model::entity::EntityId],
            ) -> $crate::repo::RepoResult<usize> {
                $crate::repo::Repository::count_exist(&self.$inner, ids)
            }

            fn get_all(
                &self,
                query: &$crate::query::QuerySpec,
                include_inactive: bool,
            ) -> $crate::repo::RepoResult<$crate::query::Page<$entity>> {
                $crate::repo::Repository::get_all(&self.$inner, query, include_inactive)
            }

            fn create(&self, entity: &$entity) -> $crate::repo::RepoResult<()> {
                $crate::repo::Repository::create(&self.$inner, entity)
            }

            fn create_batch(&self, entities: &[$entity]) -> $crate::repo::RepoResult<usize> {
                $crate::repo::Repository::create_batch(&self.$inner, entities)
            }

            fn update(&self, entity: &mut $entity) -> $crate::repo::RepoResult<()> {
                $crate::repo::Repository::update(&self.$inner, entity)
            }

            fn soft_delete(
                &self,
                id: $crate::model::entity::EntityId,
            ) -> $crate::repo::RepoResult<bool> {
                $crate::repo::Repository::soft_delete(&self.$inner, id)
            }

            fn bulk_soft_delete(
                &self,
                filter: &$crate::query::Filter,
            ) -> $crate::repo::RepoResult<usize> {
                $crate::repo::Repository::bulk_soft_delete(&self.$inner, filter)
            }

            fn count(&self, include_inactive: bool) -> $crate::repo::RepoResult<usize> {
                $crate::repo::Repository::count(&self.$inner, include_inactive)
            }
        }
    };
}

mod generic;
mod item_repo;
mod registry;
mod session;
mod sub_unit_repo;
mod unit_of_work;

pub use generic::GenericRepository;
pub use item_repo::ItemRepository;
pub use registry::RepoRegistry;
pub use sub_unit_repo::SubUnitRepository;
pub use unit_of_work::UnitOfWork;

pub use session::Session;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every entity type.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Query(QueryError),
    /// Target row is missing or soft-deleted.
    NotFound(EntityId),
    /// An insert carried `is_deleted = true`; new rows always start live.
    DeletedOnCreate(EntityId),
    /// A live row already holds a value that must be unique among live rows.
    UniqueViolation { table: &'static str },
    /// A bulk write was given a filter with no conditions.
    EmptyFilter { table: &'static str },
    /// A filter named a column the entity does not have.
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    InvalidData(String),
    /// The owning unit of work was disposed.
    SessionClosed,
    /// No specialized repository is registered for the table.
    NoNestedRepository(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::DeletedOnCreate(id) => {
                write!(f, "cannot create entity {id} already flagged as deleted")
            }
            Self::UniqueViolation { table } => {
                write!(f, "unique constraint violated among live rows of {table}")
            }
            Self::EmptyFilter { table } => {
                write!(f, "refusing bulk write on {table} without filter conditions")
            }
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` for table {table}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::SessionClosed => write!(f, "unit of work session is closed"),
            Self::NoNestedRepository(table) => {
                write!(f, "no eager-loading repository registered for {table}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::NotFound(_)
            | Self::DeletedOnCreate(_)
            | Self::UniqueViolation { .. }
            | Self::EmptyFilter { .. }
            | Self::UnknownColumn { .. }
            | Self::InvalidData(_)
            | Self::SessionClosed
            | Self::NoNestedRepository(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl RepoError {
    /// Maps a write failure, turning live-name index hits into `UniqueViolation`.
    pub(crate) fn from_write(table: &'static str, err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::UniqueViolation { table }
            }
            _ => Self::from(err),
        }
    }
}

/// CRUD, paging and soft-delete operations available for every entity.
pub trait Repository<T: Entity> {
    /// Row with `id`; soft-deleted rows only when `include_inactive`.
    fn get_by_id(&self, id: EntityId, include_inactive: bool) -> RepoResult<Option<T>>;
    /// True when a live row with `id` exists.
    fn is_exist(&self, id: EntityId) -> RepoResult<bool>;
    /// Number of distinct `ids` resolving to live rows.
    fn count_exist(&self, ids: &[EntityId]) -> RepoResult<usize>;
    /// One page in the requested order; `total` counts the same row set.
    fn get_all(&self, query: &QuerySpec, include_inactive: bool) -> RepoResult<Page<T>>;
    /// Stages an insert; a flagged entity is refused.
    fn create(&self, entity: &T) -> RepoResult<()>;
    /// Stages all inserts or none of them.
    fn create_batch(&self, entities: &[T]) -> RepoResult<usize>;
    /// Bumps `updated_at` and stages the new values of a live row.
    fn update(&self, entity: &mut T) -> RepoResult<()>;
    /// Flags a live row; false when missing or already flagged.
    fn soft_delete(&self, id: EntityId) -> RepoResult<bool>;
    /// Flags every live row matching `filter`; returns how many were flagged.
    /// A filter without conditions is refused.
    fn bulk_soft_delete(&self, filter: &Filter) -> RepoResult<usize>;
    fn count(&self, include_inactive: bool) -> RepoResult<usize>;
}

/// Eager-loading reads of a specialized repository.
pub trait NestedRepository<T: NestedEntity>: Repository<T> {
    fn get_by_id_with_nested_data(
        &self,
        id: EntityId,
        include_inactive: bool,
    ) -> RepoResult<Option<T::Detail>>;
    fn get_all_with_nested_data(
        &self,
        query: &QuerySpec,
        include_inactive: bool,
    ) -> RepoResult<Page<T::Detail>>;
}
