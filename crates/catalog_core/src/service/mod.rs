//! Domain orchestration services.
//!
//! # Responsibility
//! - Sequence validation, integrity checks, cascades and the single commit
//!   for each catalog use case.
//! - Translate repository-level absence into typed service errors.
//!
//! # Invariants
//! - Order per mutation: validate, check references, stage, `save_changes`.
//! - Creates always stage a live row with fresh timestamps.
//! - A failed mutation discards everything staged in the unit of work.
//! - Soft-deleted rows never satisfy a reference check.

use crate::model::entity::{Entity, EntityId};
use crate::model::sub_unit::dedup_ids;
use crate::query::{Page, QueryError, QuerySpec};
use crate::repo::{RepoError, UnitOfWork};
use crate::validation::{ValidationErrors, Validator};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub mod category_service;
pub mod grouping_service;
pub mod item_service;
pub mod sub_unit_service;

pub use category_service::CategoryService;
pub use grouping_service::GroupingService;
pub use item_service::ItemService;
pub use sub_unit_service::SubUnitService;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Which reference failed its existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingDependency {
    /// A single required parent is missing or soft-deleted.
    Reference { entity: &'static str, id: EntityId },
    /// Some ids of a reference set did not resolve to live rows.
    Deficit {
        entity: &'static str,
        requested: usize,
        found: usize,
    },
}

impl MissingDependency {
    /// Number of references that failed to resolve.
    pub fn deficit(&self) -> usize {
        match self {
            Self::Reference { .. } => 1,
            Self::Deficit {
                requested, found, ..
            } => requested.saturating_sub(*found),
        }
    }
}

impl Display for MissingDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference { entity, id } => write!(f, "referenced {entity} not found: {id}"),
            Self::Deficit {
                entity,
                requested,
                found,
            } => write!(
                f,
                "{} of {requested} referenced {entity} ids not found",
                requested.saturating_sub(*found)
            ),
        }
    }
}

#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationErrors),
    /// Target id does not resolve to a live row.
    NotFound { entity: &'static str, id: EntityId },
    DependentNotFound(MissingDependency),
    Query(QueryError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::DependentNotFound(missing) => write!(f, "{missing}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound { .. } | Self::DependentNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Query(err) => Self::Query(err),
            other => Self::Repo(other),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Runs one mutating use case, discarding the scope's staged writes on failure.
pub(crate) fn run_mutation<R>(
    uow: &UnitOfWork,
    op: &'static str,
    entity: &'static str,
    body: impl FnOnce() -> ServiceResult<R>,
) -> ServiceResult<R> {
    let started_at = Instant::now();
    match body() {
        Ok(value) => {
            info!(
                "event=catalog_mutation module=service status=ok op={op} entity={entity} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            match uow.discard_changes() {
                Ok(discarded) => warn!(
                    "event=catalog_mutation module=service status=error op={op} entity={entity} discarded_rows={discarded} error={err}"
                ),
                Err(discard_err) => error!(
                    "event=catalog_mutation module=service status=error op={op} entity={entity} error={err} discard_error={discard_err}"
                ),
            }
            Err(err)
        }
    }
}

pub(crate) fn validate<T: Entity>(validator: &impl Validator<T>, candidate: &T) -> ServiceResult<()> {
    ValidationErrors::check(T::NAME, validator.validate(candidate)).map_err(Into::into)
}

/// Fails unless `id` resolves to a live `T`.
pub(crate) fn require_live<T: Entity>(uow: &UnitOfWork, id: EntityId) -> ServiceResult<()> {
    if uow.repo::<T>()?.is_exist(id)? {
        Ok(())
    } else {
        Err(ServiceError::DependentNotFound(MissingDependency::Reference {
            entity: T::NAME,
            id,
        }))
    }
}

/// Fails unless every distinct id in `ids` resolves to a live `T`.
pub(crate) fn require_all_live<T: Entity>(uow: &UnitOfWork, ids: &[EntityId]) -> ServiceResult<()> {
    let requested = dedup_ids(ids.iter().copied());
    if requested.is_empty() {
        return Ok(());
    }
    let found = uow.repo::<T>()?.count_exist(&requested)?;
    if found < requested.len() {
        return Err(ServiceError::DependentNotFound(MissingDependency::Deficit {
            entity: T::NAME,
            requested: requested.len(),
            found,
        }));
    }
    Ok(())
}

/// Stamps `entity` as a live row created now, stages it and commits.
pub(crate) fn insert_live<T: Entity>(uow: &UnitOfWork, mut entity: T) -> ServiceResult<T> {
    entity.meta_mut().mark_created();
    uow.repo::<T>()?.create(&entity)?;
    uow.save_changes()?;
    Ok(entity)
}

pub(crate) fn get_live<T: Entity>(uow: &UnitOfWork, id: EntityId) -> ServiceResult<T> {
    uow.repo::<T>()?
        .get_by_id(id, false)?
        .ok_or(ServiceError::NotFound {
            entity: T::NAME,
            id,
        })
}

pub(crate) fn list_live<T: Entity>(uow: &UnitOfWork, query: &QuerySpec) -> ServiceResult<Page<T>> {
    Ok(uow.repo::<T>()?.get_all(query, false)?)
}

/// Validates, checks the target is live, then stages and commits the update.
///
/// The stored creation timestamp wins over whatever `candidate` carries.
pub(crate) fn update_live<T: Entity>(
    uow: &UnitOfWork,
    validator: &impl Validator<T>,
    mut candidate: T,
    check_references: impl FnOnce(&T) -> ServiceResult<()>,
) -> ServiceResult<T> {
    let id = candidate.id();
    let repo = uow.repo::<T>()?;
    let existing = repo.get_by_id(id, false)?.ok_or(ServiceError::NotFound {
        entity: T::NAME,
        id,
    })?;
    {
        let meta = candidate.meta_mut();
        meta.created_at = existing.meta().created_at;
        meta.updated_at = existing.meta().updated_at;
        meta.is_deleted = false;
    }

    validate(validator, &candidate)?;
    check_references(&candidate)?;

    repo.update(&mut candidate).map_err(|err| match err {
        RepoError::NotFound(id) => ServiceError::NotFound {
            entity: T::NAME,
            id,
        },
        other => other.into(),
    })?;
    uow.save_changes()?;
    Ok(candidate)
}

/// Stages a soft delete of `id` and fails when it was not live.
pub(crate) fn soft_delete_live<T: Entity>(uow: &UnitOfWork, id: EntityId) -> ServiceResult<()> {
    if uow.repo::<T>()?.soft_delete(id)? {
        Ok(())
    } else {
        Err(ServiceError::NotFound {
            entity: T::NAME,
            id,
        })
    }
}
