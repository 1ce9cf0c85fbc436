//! Item repository with its category eager-loaded.
//!
//! # Invariants
//! - Relations load in one batched query per page, never one per row.
//! - A soft-deleted category loads as `None`.

use crate::model::category::Category;
use crate::model::entity::{Entity, EntityId};
use crate::model::item::{Item, ItemDetail};
use crate::model::sub_unit::dedup_ids;
use crate::query::{Page, QuerySpec};
use crate::repo::{GenericRepository, NestedRepository, RepoResult, Repository, Session};
use std::collections::HashMap;
use std::rc::Rc;

pub struct ItemRepository {
    items: GenericRepository<Item>,
    categories: GenericRepository<Category>,
}

impl ItemRepository {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        Self {
            items: GenericRepository::new(Rc::clone(&session)),
            categories: GenericRepository::new(session),
        }
    }

    fn attach_categories(&self, items: Vec<Item>) -> RepoResult<Vec<ItemDetail>> {
        let category_ids = dedup_ids(items.iter().map(|item| item.category_id));
        let categories: HashMap<EntityId, Category> = self
            .categories
            .fetch_live_by_ids(&category_ids)?
            .into_iter()
            .map(|category| (category.id(), category))
            .collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let category = categories.get(&item.category_id).cloned();
                ItemDetail { item, category }
            })
            .collect())
    }
}

delegate_repository!(ItemRepository, Item, items);

impl NestedRepository<Item> for ItemRepository {
    fn get_by_id_with_nested_data(
        &self,
        id: EntityId,
        include_inactive: bool,
    ) -> RepoResult<Option<ItemDetail>> {
        let Some(item) = self.items.get_by_id(id, include_inactive)? else {
            return Ok(None);
        };
        Ok(self.attach_categories(vec![item])?.pop())
    }

    fn get_all_with_nested_data(
        &self,
        query: &QuerySpec,
        include_inactive: bool,
    ) -> RepoResult<Page<ItemDetail>> {
        let Page {
            items,
            page,
            size,
            total,
        } = self.items.get_all(query, include_inactive)?;
        Ok(Page {
            items: self.attach_categories(items)?,
            page,
            size,
            total,
        })
    }
}
