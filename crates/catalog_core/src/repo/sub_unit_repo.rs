//! Sub-unit repository with its grouping and items eager-loaded.
//!
//! # Invariants
//! - One query for the page of sub-units, then one per relation.
//! - Loaded items follow each sub-unit's stored `item_ids` order; ids that no
//!   longer resolve to a live item are skipped.

use crate::model::entity::{Entity, EntityId};
use crate::model::grouping::Grouping;
use crate::model::item::Item;
use crate::model::sub_unit::{dedup_ids, SubUnit, SubUnitDetail};
use crate::query::{Page, QuerySpec};
use crate::repo::{GenericRepository, NestedRepository, RepoResult, Repository, Session};
use std::collections::HashMap;
use std::rc::Rc;

pub struct SubUnitRepository {
    sub_units: GenericRepository<SubUnit>,
    groupings: GenericRepository<Grouping>,
    items: GenericRepository<Item>,
}

impl SubUnitRepository {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        Self {
            sub_units: GenericRepository::new(Rc::clone(&session)),
            groupings: GenericRepository::new(Rc::clone(&session)),
            items: GenericRepository::new(session),
        }
    }

    fn attach_relations(&self, sub_units: Vec<SubUnit>) -> RepoResult<Vec<SubUnitDetail>> {
        let grouping_ids = dedup_ids(sub_units.iter().map(|sub_unit| sub_unit.grouping_id));
        let groupings = by_id(self.groupings.fetch_live_by_ids(&grouping_ids)?);

        let item_ids = dedup_ids(
            sub_units
                .iter()
                .flat_map(|sub_unit| sub_unit.item_ids.iter().copied()),
        );
        let items = by_id(self.items.fetch_live_by_ids(&item_ids)?);

        Ok(sub_units
            .into_iter()
            .map(|sub_unit| {
                let grouping = groupings.get(&sub_unit.grouping_id).cloned();
                let items = sub_unit
                    .item_ids
                    .iter()
                    .filter_map(|id| items.get(id).cloned())
                    .collect();
                SubUnitDetail {
                    sub_unit,
                    grouping,
                    items,
                }
            })
            .collect())
    }
}

fn by_id<T: Entity>(entities: Vec<T>) -> HashMap<EntityId, T> {
    entities
        .into_iter()
        .map(|entity| (entity.id(), entity))
        .collect()
}

delegate_repository!(SubUnitRepository, SubUnit, sub_units);

impl NestedRepository<SubUnit> for SubUnitRepository {
    fn get_by_id_with_nested_data(
        &self,
        id: EntityId,
        include_inactive: bool,
    ) -> RepoResult<Option<SubUnitDetail>> {
        let Some(sub_unit) = self.sub_units.get_by_id(id, include_inactive)? else {
            return Ok(None);
        };
        Ok(self.attach_relations(vec![sub_unit])?.pop())
    }

    fn get_all_with_nested_data(
        &self,
        query: &QuerySpec,
        include_inactive: bool,
    ) -> RepoResult<Page<SubUnitDetail>> {
        let Page {
            items,
            page,
            size,
            total,
        } = self.sub_units.get_all(query, include_inactive)?;
        Ok(Page {
            items: self.attach_relations(items)?,
            page,
            size,
            total,
        })
    }
}
