//! Category use cases.
//!
//! # Invariants
//! - Deleting a category soft-deletes every live item referencing it in the
//!   same commit; a missing category leaves its items untouched.

use crate::model::category::Category;
use crate::model::entity::{Entity, EntityId};
use crate::model::item::Item;
use crate::query::{Filter, Page, QuerySpec};
use crate::repo::UnitOfWork;
use crate::service::{
    get_live, insert_live, list_live, run_mutation, soft_delete_live, update_live, validate,
    ServiceResult,
};
use crate::validation::{CategoryRules, Validator};
use log::info;

pub struct CategoryService<'uow, V = CategoryRules> {
    uow: &'uow UnitOfWork,
    validator: V,
}

impl<'uow> CategoryService<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self::with_validator(uow, CategoryRules)
    }
}

impl<'uow, V: Validator<Category>> CategoryService<'uow, V> {
    pub fn with_validator(uow: &'uow UnitOfWork, validator: V) -> Self {
        Self { uow, validator }
    }

    pub fn create(&self, category: Category) -> ServiceResult<Category> {
        run_mutation(self.uow, "create", Category::NAME, || {
            validate(&self.validator, &category)?;
            insert_live(self.uow, category)
        })
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<Category> {
        get_live(self.uow, id)
    }

    pub fn list(&self, query: &QuerySpec) -> ServiceResult<Page<Category>> {
        list_live(self.uow, query)
    }

    pub fn update(&self, category: Category) -> ServiceResult<Category> {
        run_mutation(self.uow, "update", Category::NAME, || {
            update_live(self.uow, &self.validator, category, |_| Ok(()))
        })
    }

    /// Soft-deletes the category and cascades to its live items.
    ///
    /// Returns whether the commit affected any rows.
    pub fn delete(&self, id: EntityId) -> ServiceResult<bool> {
        run_mutation(self.uow, "delete", Category::NAME, || {
            let cascaded = self
                .uow
                .repo::<Item>()?
                .bulk_soft_delete(&Filter::new().eq_id("category_id", id))?;
            info!(
                "event=cascade_soft_delete module=service status=ok parent=category parent_id={id} child=item rows={cascaded}"
            );

            soft_delete_live::<Category>(self.uow, id)?;
            Ok(self.uow.save_changes()? > 0)
        })
    }
}
