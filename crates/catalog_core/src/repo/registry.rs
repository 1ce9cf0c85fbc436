//! Explicit entity-type → repository constructor table.
//!
//! # Invariants
//! - Types without an entry get `GenericRepository<T>`.
//! - Entries are added through `register_nested`, for crate and caller types
//!   alike.
//! - A specialized entry serves both the generic and the eager-loading view
//!   from one instance.

use crate::model::entity::{Entity, NestedEntity};
use crate::model::item::Item;
use crate::model::sub_unit::SubUnit;
use crate::query::validate_sort_fields;
use crate::repo::{
    GenericRepository, ItemRepository, NestedRepository, RepoError, RepoResult, Repository,
    Session, SubUnitRepository,
};
use log::debug;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

type RepoFactory = Arc<dyn Fn(Rc<Session>) -> Box<dyn Any> + Send + Sync>;

/// A repository built for one scope, with its optional eager-loading view.
pub(crate) struct RepoSlot<T: Entity> {
    pub(crate) base: Rc<dyn Repository<T>>,
    /// `Rc<dyn NestedRepository<T>>` when `T` has a specialized repository.
    pub(crate) nested: Option<Box<dyn Any>>,
}

#[derive(Clone, Default)]
pub struct RepoRegistry {
    factories: HashMap<TypeId, RepoFactory>,
}

impl RepoRegistry {
    /// Registry with no specialized repositories; every type is generic.
    pub fn generic_only() -> Self {
        Self::default()
    }

    /// Registry with the Item and Sub-unit eager-loading repositories.
    pub fn standard() -> Self {
        let mut registry = Self::default();
        registry.register_nested::<Item, _>(ItemRepository::new);
        registry.register_nested::<SubUnit, _>(SubUnitRepository::new);
        registry
    }

    pub fn is_specialized<T: Entity>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<T>())
    }

    /// Serves `T` through the repository `constructor` builds, replacing any
    /// earlier entry for `T`. The constructor runs once per unit of work.
    pub fn register_nested<T, R>(&mut self, constructor: fn(Rc<Session>) -> R)
    where
        T: NestedEntity,
        R: NestedRepository<T> + 'static,
    {
        let factory: RepoFactory = Arc::new(move |session: Rc<Session>| -> Box<dyn Any> {
            let repo = Rc::new(constructor(session));
            let nested: Rc<dyn NestedRepository<T>> = repo.clone();
            let base: Rc<dyn Repository<T>> = repo;
            Box::new(RepoSlot::<T> {
                base,
                nested: Some(Box::new(nested)),
            })
        });
        self.factories.insert(TypeId::of::<T>(), factory);
    }

    /// Builds the repository for `T`, checking its sort-field table first.
    pub(crate) fn build<T: Entity>(&self, session: Rc<Session>) -> RepoResult<RepoSlot<T>> {
        validate_sort_fields::<T>()?;

        let Some(factory) = self.factories.get(&TypeId::of::<T>()) else {
            debug!(
                "event=repo_build module=repo status=ok kind=generic table={}",
                T::TABLE
            );
            return Ok(RepoSlot {
                base: Rc::new(GenericRepository::<T>::new(session)),
                nested: None,
            });
        };

        let slot = factory(session).downcast::<RepoSlot<T>>().map_err(|_| {
            RepoError::InvalidData(format!(
                "registered repository for {} has the wrong entity type",
                T::TABLE
            ))
        })?;
        debug!(
            "event=repo_build module=repo status=ok kind=specialized table={}",
            T::TABLE
        );
        Ok(*slot)
    }
}

#[cfg(test)]
mod tests {
    use super::RepoRegistry;
    use crate::model::category::Category;
    use crate::model::item::Item;
    use crate::model::sub_unit::SubUnit;

    #[test]
    fn standard_registry_specializes_item_and_sub_unit_only() {
        let registry = RepoRegistry::standard();
        assert!(registry.is_specialized::<Item>());
        assert!(registry.is_specialized::<SubUnit>());
        assert!(!registry.is_specialized::<Category>());
    }

    #[test]
    fn generic_only_registry_is_empty() {
        assert!(!RepoRegistry::generic_only().is_specialized::<Item>());
    }
}
