//! Item use cases.
//!
//! # Invariants
//! - An item is only staged once its category resolves to a live row.
//! - Deleting an item does not touch sub-units that list it.

use crate::model::category::Category;
use crate::model::entity::{Entity, EntityId};
use crate::model::item::{Item, ItemDetail};
use crate::query::{Page, QuerySpec};
use crate::repo::UnitOfWork;
use crate::service::{
    get_live, insert_live, list_live, require_live, run_mutation, soft_delete_live, update_live,
    validate, ServiceError, ServiceResult,
};
use crate::validation::{ItemRules, Validator};

pub struct ItemService<'uow, V = ItemRules> {
    uow: &'uow UnitOfWork,
    validator: V,
}

impl<'uow> ItemService<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self::with_validator(uow, ItemRules)
    }
}

impl<'uow, V: Validator<Item>> ItemService<'uow, V> {
    pub fn with_validator(uow: &'uow UnitOfWork, validator: V) -> Self {
        Self { uow, validator }
    }

    pub fn create(&self, item: Item) -> ServiceResult<Item> {
        run_mutation(self.uow, "create", Item::NAME, || {
            validate(&self.validator, &item)?;
            require_live::<Category>(self.uow, item.category_id)?;
            insert_live(self.uow, item)
        })
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<Item> {
        get_live(self.uow, id)
    }

    /// Item with its category loaded.
    pub fn get_detail(&self, id: EntityId) -> ServiceResult<ItemDetail> {
        self.uow
            .nested_repo::<Item>()?
            .get_by_id_with_nested_data(id, false)?
            .ok_or(ServiceError::NotFound {
                entity: Item::NAME,
                id,
            })
    }

    pub fn list(&self, query: &QuerySpec) -> ServiceResult<Page<Item>> {
        list_live(self.uow, query)
    }

    pub fn list_detailed(&self, query: &QuerySpec) -> ServiceResult<Page<ItemDetail>> {
        Ok(self
            .uow
            .nested_repo::<Item>()?
            .get_all_with_nested_data(query, false)?)
    }

    pub fn update(&self, item: Item) -> ServiceResult<Item> {
        run_mutation(self.uow, "update", Item::NAME, || {
            update_live(self.uow, &self.validator, item, |candidate| {
                require_live::<Category>(self.uow, candidate.category_id)
            })
        })
    }

    pub fn delete(&self, id: EntityId) -> ServiceResult<bool> {
        run_mutation(self.uow, "delete", Item::NAME, || {
            soft_delete_live::<Item>(self.uow, id)?;
            Ok(self.uow.save_changes()? > 0)
        })
    }
}
