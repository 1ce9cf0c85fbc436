//! Sub-unit use cases.
//!
//! # Invariants
//! - The grouping must be live and every listed item must be live before the
//!   sub-unit is staged.
//! - `item_ids` is stored de-duplicated in first-seen order.

use crate::model::entity::{Entity, EntityId};
use crate::model::grouping::Grouping;
use crate::model::item::Item;
use crate::model::sub_unit::{dedup_ids, SubUnit, SubUnitDetail};
use crate::query::{Page, QuerySpec};
use crate::repo::UnitOfWork;
use crate::service::{
    get_live, insert_live, list_live, require_all_live, require_live, run_mutation,
    soft_delete_live, update_live, validate, ServiceError, ServiceResult,
};
use crate::validation::{SubUnitRules, Validator};

pub struct SubUnitService<'uow, V = SubUnitRules> {
    uow: &'uow UnitOfWork,
    validator: V,
}

impl<'uow> SubUnitService<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self::with_validator(uow, SubUnitRules)
    }
}

impl<'uow, V: Validator<SubUnit>> SubUnitService<'uow, V> {
    pub fn with_validator(uow: &'uow UnitOfWork, validator: V) -> Self {
        Self { uow, validator }
    }

    pub fn create(&self, mut sub_unit: SubUnit) -> ServiceResult<SubUnit> {
        run_mutation(self.uow, "create", SubUnit::NAME, || {
            sub_unit.item_ids = dedup_ids(sub_unit.item_ids.iter().copied());
            validate(&self.validator, &sub_unit)?;
            self.check_references(&sub_unit)?;
            insert_live(self.uow, sub_unit)
        })
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<SubUnit> {
        get_live(self.uow, id)
    }

    /// Sub-unit with its grouping and live items loaded.
    pub fn get_detail(&self, id: EntityId) -> ServiceResult<SubUnitDetail> {
        self.uow
            .nested_repo::<SubUnit>()?
            .get_by_id_with_nested_data(id, false)?
            .ok_or(ServiceError::NotFound {
                entity: SubUnit::NAME,
                id,
            })
    }

    pub fn list(&self, query: &QuerySpec) -> ServiceResult<Page<SubUnit>> {
        list_live(self.uow, query)
    }

    pub fn list_detailed(&self, query: &QuerySpec) -> ServiceResult<Page<SubUnitDetail>> {
        Ok(self
            .uow
            .nested_repo::<SubUnit>()?
            .get_all_with_nested_data(query, false)?)
    }

    pub fn update(&self, mut sub_unit: SubUnit) -> ServiceResult<SubUnit> {
        run_mutation(self.uow, "update", SubUnit::NAME, || {
            sub_unit.item_ids = dedup_ids(sub_unit.item_ids.iter().copied());
            update_live(self.uow, &self.validator, sub_unit, |candidate| {
                self.check_references(candidate)
            })
        })
    }

    /// Plain soft delete; the grouping and items are untouched.
    pub fn delete(&self, id: EntityId) -> ServiceResult<bool> {
        run_mutation(self.uow, "delete", SubUnit::NAME, || {
            soft_delete_live::<SubUnit>(self.uow, id)?;
            Ok(self.uow.save_changes()? > 0)
        })
    }

    fn check_references(&self, sub_unit: &SubUnit) -> ServiceResult<()> {
        require_live::<Grouping>(self.uow, sub_unit.grouping_id)?;
        require_all_live::<Item>(self.uow, &sub_unit.item_ids)
    }
}
