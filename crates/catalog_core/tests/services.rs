use catalog_core::db::open_db_in_memory;
use catalog_core::query::QueryError;
use catalog_core::{
    Category, CategoryService, Entity, Grouping, GroupingService, Item, ItemService,
    MissingDependency, QuerySpec, RepoError, Repository, ServiceError, SubUnit, SubUnitService,
    UnitOfWork, Violation,
};
use uuid::Uuid;

fn scope() -> UnitOfWork {
    UnitOfWork::new(open_db_in_memory().unwrap())
}

fn live_count<T: Entity>(uow: &UnitOfWork) -> usize {
    uow.repo::<T>().unwrap().count(false).unwrap()
}

fn seed_category_with_items(uow: &UnitOfWork, name: &str, item_count: usize) -> (Category, Vec<Item>) {
    let category = CategoryService::new(uow)
        .create(Category::new(name, "d", "red"))
        .unwrap();
    let items = (0..item_count)
        .map(|n| {
            ItemService::new(uow)
                .create(Item::new(format!("{name} item {n}"), "d", "img.png", category.id()))
                .unwrap()
        })
        .collect();
    (category, items)
}

#[test]
fn deleting_category_cascades_to_its_live_items() {
    let uow = scope();
    let (fruit, fruit_items) = seed_category_with_items(&uow, "Fruit", 3);
    let (_tools, tool_items) = seed_category_with_items(&uow, "Tools", 1);

    assert!(CategoryService::new(&uow).delete(fruit.id()).unwrap());

    let items = uow.repo::<Item>().unwrap();
    for item in &fruit_items {
        let stored = items.get_by_id(item.id(), true).unwrap().unwrap();
        assert!(stored.meta.is_deleted);
    }
    assert!(items.is_exist(tool_items[0].id()).unwrap());
    let category = uow
        .repo::<Category>()
        .unwrap()
        .get_by_id(fruit.id(), true)
        .unwrap()
        .unwrap();
    assert!(category.meta.is_deleted);
    assert_eq!(live_count::<Item>(&uow), 1);
}

#[test]
fn deleting_missing_category_flags_nothing() {
    let uow = scope();
    let (_fruit, _items) = seed_category_with_items(&uow, "Fruit", 2);
    let missing = Uuid::new_v4();

    let err = CategoryService::new(&uow).delete(missing).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { entity: "category", id } if id == missing
    ));
    assert_eq!(live_count::<Item>(&uow), 2);
    assert!(!uow.has_pending_changes());
}

#[test]
fn deleting_category_twice_is_not_found_and_keeps_cascade_uncommitted() {
    let uow = scope();
    let (fruit, _items) = seed_category_with_items(&uow, "Fruit", 1);
    let service = CategoryService::new(&uow);
    service.delete(fruit.id()).unwrap();

    assert!(matches!(
        service.delete(fruit.id()),
        Err(ServiceError::NotFound { .. })
    ));
    assert_eq!(uow.save_changes().unwrap(), 0);
}

#[test]
fn creating_item_with_missing_category_leaves_items_unchanged() {
    let uow = scope();
    let (_fruit, _items) = seed_category_with_items(&uow, "Fruit", 1);
    let missing = Uuid::new_v4();

    let err = ItemService::new(&uow)
        .create(Item::new("Orphan", "d", "img.png", missing))
        .unwrap_err();
    match err {
        ServiceError::DependentNotFound(MissingDependency::Reference { entity, id }) => {
            assert_eq!(entity, "category");
            assert_eq!(id, missing);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(uow.repo::<Item>().unwrap().count(true).unwrap(), 1);
}

#[test]
fn creating_item_under_soft_deleted_category_fails() {
    let uow = scope();
    let (fruit, _items) = seed_category_with_items(&uow, "Fruit", 0);
    CategoryService::new(&uow).delete(fruit.id()).unwrap();

    let err = ItemService::new(&uow)
        .create(Item::new("Late", "d", "img.png", fruit.id()))
        .unwrap_err();
    assert!(matches!(err, ServiceError::DependentNotFound(_)));
}

#[test]
fn sub_unit_with_partially_missing_items_reports_deficit() {
    let uow = scope();
    let (_fruit, items) = seed_category_with_items(&uow, "Fruit", 3);
    let grouping = GroupingService::new(&uow)
        .create(Grouping::new("Basics", "d", 1, 3))
        .unwrap();

    let mut item_ids: Vec<Uuid> = items.iter().map(Entity::id).collect();
    item_ids.push(Uuid::new_v4());
    item_ids.push(Uuid::new_v4());

    let err = SubUnitService::new(&uow)
        .create(SubUnit::new("Intro", "Body", "year-1", grouping.id(), item_ids))
        .unwrap_err();
    match err {
        ServiceError::DependentNotFound(missing) => {
            assert_eq!(
                missing,
                MissingDependency::Deficit {
                    entity: "item",
                    requested: 5,
                    found: 3
                }
            );
            assert_eq!(missing.deficit(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(uow.repo::<SubUnit>().unwrap().count(true).unwrap(), 0);
}

#[test]
fn sub_unit_create_deduplicates_item_ids() {
    let uow = scope();
    let (_fruit, items) = seed_category_with_items(&uow, "Fruit", 1);
    let grouping = GroupingService::new(&uow)
        .create(Grouping::new("Basics", "d", 1, 3))
        .unwrap();
    let mut sub_unit = SubUnit::new("Intro", "Body", "year-1", grouping.id(), []);
    sub_unit.item_ids = vec![items[0].id(), items[0].id()];

    let created = SubUnitService::new(&uow).create(sub_unit).unwrap();
    assert_eq!(created.item_ids, vec![items[0].id()]);
    let stored = SubUnitService::new(&uow).get(created.id()).unwrap();
    assert_eq!(stored.item_ids, vec![items[0].id()]);
}

#[test]
fn update_of_nonexistent_id_is_not_found_and_stages_nothing() {
    let uow = scope();
    let ghost = Category::new("Ghost", "d", "grey");

    let err = CategoryService::new(&uow).update(ghost.clone()).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { entity: "category", id } if id == ghost.id()
    ));
    assert!(!uow.has_pending_changes());
    assert_eq!(uow.save_changes().unwrap(), 0);
}

#[test]
fn update_keeps_creation_timestamp() {
    let uow = scope();
    let (fruit, _items) = seed_category_with_items(&uow, "Fruit", 0);
    let service = CategoryService::new(&uow);

    let mut changes = fruit.clone();
    changes.description = "Fresh".to_string();
    changes.meta.created_at = 0;
    let updated = service.update(changes).unwrap();

    assert_eq!(updated.meta.created_at, fruit.meta.created_at);
    let stored = service.get(fruit.id()).unwrap();
    assert_eq!(stored.description, "Fresh");
    assert_eq!(stored.meta.created_at, fruit.meta.created_at);
}

#[test]
fn item_update_rechecks_category() {
    let uow = scope();
    let (_fruit, items) = seed_category_with_items(&uow, "Fruit", 1);
    let mut moved = items[0].clone();
    moved.category_id = Uuid::new_v4();

    let err = ItemService::new(&uow).update(moved).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::DependentNotFound(MissingDependency::Reference {
            entity: "category",
            ..
        })
    ));
    let stored = ItemService::new(&uow).get(items[0].id()).unwrap();
    assert_eq!(stored.category_id, items[0].category_id);
}

#[test]
fn sub_unit_update_reports_item_deficit_and_keeps_stored_row() {
    let uow = scope();
    let (_fruit, items) = seed_category_with_items(&uow, "Fruit", 2);
    let grouping = GroupingService::new(&uow)
        .create(Grouping::new("Basics", "d", 1, 3))
        .unwrap();
    let service = SubUnitService::new(&uow);
    let created = service
        .create(SubUnit::new("Intro", "Body", "year-1", grouping.id(), [items[0].id()]))
        .unwrap();

    let mut changes = created.clone();
    changes.content = "Rewritten".to_string();
    changes.item_ids = vec![items[0].id(), items[1].id(), Uuid::new_v4()];
    let err = service.update(changes).unwrap_err();

    match err {
        ServiceError::DependentNotFound(missing) => {
            assert_eq!(
                missing,
                MissingDependency::Deficit {
                    entity: "item",
                    requested: 3,
                    found: 2
                }
            );
            assert_eq!(missing.deficit(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!uow.has_pending_changes());
    let stored = service.get(created.id()).unwrap();
    assert_eq!(stored.content, "Body");
    assert_eq!(stored.item_ids, vec![items[0].id()]);
}

#[test]
fn sub_unit_update_into_soft_deleted_grouping_fails() {
    let uow = scope();
    let groupings = GroupingService::new(&uow);
    let basics = groupings.create(Grouping::new("Basics", "d", 1, 3)).unwrap();
    let retired = groupings.create(Grouping::new("Retired", "d", 1, 3)).unwrap();
    let service = SubUnitService::new(&uow);
    let created = service
        .create(SubUnit::new("Intro", "Body", "year-1", basics.id(), []))
        .unwrap();
    groupings.delete(retired.id()).unwrap();

    let mut moved = created.clone();
    moved.grouping_id = retired.id();
    let err = service.update(moved).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::DependentNotFound(MissingDependency::Reference { entity: "grouping", id })
            if id == retired.id()
    ));
    assert_eq!(service.get(created.id()).unwrap().grouping_id, basics.id());
}

#[test]
fn create_stages_live_row_even_when_input_is_flagged() {
    let uow = scope();
    let service = CategoryService::new(&uow);
    let mut payload = Category::new("Animals", "d", "green");
    payload.meta.is_deleted = true;
    payload.meta.created_at = 1;
    payload.meta.updated_at = 1;

    let created = service.create(payload.clone()).unwrap();

    assert!(!created.meta.is_deleted);
    assert_eq!(created.id(), payload.id());
    assert!(created.meta.created_at > 1);
    assert_eq!(created.meta.created_at, created.meta.updated_at);
    assert_eq!(service.get(payload.id()).unwrap(), created);
    assert_eq!(live_count::<Category>(&uow), 1);
}

#[test]
fn validation_failure_reports_every_violation_and_stages_nothing() {
    let uow = scope();
    let err = GroupingService::new(&uow)
        .create(Grouping::new("", "", 4, 2))
        .unwrap_err();

    match err {
        ServiceError::Validation(errors) => {
            assert_eq!(errors.entity, "grouping");
            assert!(errors.has_field("name"));
            assert!(errors.has_field("description"));
            assert!(errors.has_field("core_capacity"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(live_count::<Grouping>(&uow), 0);
}

#[test]
fn custom_validator_replaces_default_rules() {
    let uow = scope();
    let no_grey = |category: &Category| {
        if category.display_color == "grey" {
            vec![Violation::new("display_color", "grey is reserved")]
        } else {
            Vec::new()
        }
    };
    let service = CategoryService::with_validator(&uow, no_grey);

    assert!(matches!(
        service.create(Category::new("Ash", "d", "grey")),
        Err(ServiceError::Validation(_))
    ));
    assert!(service.create(Category::new("Ash", "", "white")).is_ok());
}

#[test]
fn live_name_is_reusable_after_soft_delete() {
    let uow = scope();
    let service = CategoryService::new(&uow);
    let first = service.create(Category::new("Animals", "d", "green")).unwrap();

    let duplicate = service
        .create(Category::new("Animals", "d", "green"))
        .unwrap_err();
    assert!(matches!(
        duplicate,
        ServiceError::Repo(RepoError::UniqueViolation { .. })
    ));

    service.delete(first.id()).unwrap();
    assert!(service.create(Category::new("Animals", "d", "green")).is_ok());
}

#[test]
fn deleting_grouping_cascades_to_sub_units() {
    let uow = scope();
    let groupings = GroupingService::new(&uow);
    let basics = groupings.create(Grouping::new("Basics", "d", 1, 2)).unwrap();
    let advanced = groupings.create(Grouping::new("Advanced", "d", 1, 2)).unwrap();
    let sub_units = SubUnitService::new(&uow);
    for name in ["One", "Two"] {
        sub_units
            .create(SubUnit::new(name, "Body", "year-1", basics.id(), []))
            .unwrap();
    }
    let kept = sub_units
        .create(SubUnit::new("Three", "Body", "year-2", advanced.id(), []))
        .unwrap();

    assert!(groupings.delete(basics.id()).unwrap());

    assert_eq!(live_count::<SubUnit>(&uow), 1);
    assert!(sub_units.get(kept.id()).is_ok());
    assert!(matches!(
        groupings.get(basics.id()),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn deleting_item_leaves_sub_units_alone() {
    let uow = scope();
    let (_fruit, items) = seed_category_with_items(&uow, "Fruit", 2);
    let grouping = GroupingService::new(&uow)
        .create(Grouping::new("Basics", "d", 1, 2))
        .unwrap();
    let sub_unit = SubUnitService::new(&uow)
        .create(SubUnit::new(
            "Intro",
            "Body",
            "year-1",
            grouping.id(),
            items.iter().map(Entity::id),
        ))
        .unwrap();

    assert!(ItemService::new(&uow).delete(items[0].id()).unwrap());

    let detail = SubUnitService::new(&uow).get_detail(sub_unit.id()).unwrap();
    assert_eq!(detail.sub_unit.item_ids.len(), 2);
    assert_eq!(detail.items, vec![items[1].clone()]);
}

#[test]
fn detailed_item_reads_go_through_nested_repository() {
    let uow = scope();
    let (fruit, items) = seed_category_with_items(&uow, "Fruit", 2);
    let service = ItemService::new(&uow);

    let detail = service.get_detail(items[0].id()).unwrap();
    assert_eq!(detail.category, Some(fruit));

    let page = service.list_detailed(&QuerySpec::default()).unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|detail| detail.category.is_some()));
}

#[test]
fn list_rejects_unknown_sort_field() {
    let uow = scope();
    let err = ItemService::new(&uow)
        .list(&QuerySpec::new(1, 10, Some("weight"), None))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Query(QueryError::UnknownSortField { entity: "item", .. })
    ));
}
