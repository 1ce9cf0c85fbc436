//! Grouping use cases; deleting a grouping cascades to its sub-units.

use crate::model::entity::{Entity, EntityId};
use crate::model::grouping::Grouping;
use crate::model::sub_unit::SubUnit;
use crate::query::{Filter, Page, QuerySpec};
use crate::repo::UnitOfWork;
use crate::service::{
    get_live, insert_live, list_live, run_mutation, soft_delete_live, update_live, validate,
    ServiceResult,
};
use crate::validation::{GroupingRules, Validator};
use log::info;

pub struct GroupingService<'uow, V = GroupingRules> {
    uow: &'uow UnitOfWork,
    validator: V,
}

impl<'uow> GroupingService<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self::with_validator(uow, GroupingRules)
    }
}

impl<'uow, V: Validator<Grouping>> GroupingService<'uow, V> {
    pub fn with_validator(uow: &'uow UnitOfWork, validator: V) -> Self {
        Self { uow, validator }
    }

    pub fn create(&self, grouping: Grouping) -> ServiceResult<Grouping> {
        run_mutation(self.uow, "create", Grouping::NAME, || {
            validate(&self.validator, &grouping)?;
            insert_live(self.uow, grouping)
        })
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<Grouping> {
        get_live(self.uow, id)
    }

    pub fn list(&self, query: &QuerySpec) -> ServiceResult<Page<Grouping>> {
        list_live(self.uow, query)
    }

    pub fn update(&self, grouping: Grouping) -> ServiceResult<Grouping> {
        run_mutation(self.uow, "update", Grouping::NAME, || {
            update_live(self.uow, &self.validator, grouping, |_| Ok(()))
        })
    }

    /// Soft-deletes the grouping and every live sub-unit inside it.
    pub fn delete(&self, id: EntityId) -> ServiceResult<bool> {
        run_mutation(self.uow, "delete", Grouping::NAME, || {
            let cascaded = self
                .uow
                .repo::<SubUnit>()?
                .bulk_soft_delete(&Filter::new().eq_id("grouping_id", id))?;
            info!(
                "event=cascade_soft_delete module=service status=ok parent=grouping parent_id={id} child=sub_unit rows={cascaded}"
            );

            soft_delete_live::<Grouping>(self.uow, id)?;
            Ok(self.uow.save_changes()? > 0)
        })
    }
}
