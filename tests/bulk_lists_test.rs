mod common;

use common::*;
use tasklist_core::bulk::{
    BulkCreateListsRequest, BulkMoveRequest, BulkUpdateListsRequest, CreateListsOptions,
    DeleteOptions, ListStatusOptions, MoveOptions, UpdateEntry, UpdateOptions,
};
use tasklist_core::models::{ListPatch, NewList};
use tasklist_core::store::{ItemStore, ListStore};
use tasklist_core::{InMemoryStore, ItemStatus, ListStatus};

/// root
/// ├── a
/// │   └── a1 (holds item i1)
/// └── b
fn tree_store() -> InMemoryStore {
    seeded_store(
        vec![
            ListBuilder::new("root").build(),
            ListBuilder::new("a").with_parent("root").build(),
            ListBuilder::new("a1").with_parent("a").build(),
            ListBuilder::new("b").with_parent("root").build(),
        ],
        vec![ItemBuilder::new("i1", "a1").build()],
    )
}

async fn parent_of(store: &InMemoryStore, id: &str) -> Option<String> {
    store.get_list(id).await.unwrap().unwrap().parent_list_id
}

#[tokio::test]
async fn test_create_nested_lists_in_one_batch() {
    let harness = TestHarness::empty();
    let request = BulkCreateListsRequest {
        lists: vec![
            NewList::new("Projects").with_id("projects"),
            NewList::new("Website").with_id("website").with_parent("projects"),
            NewList::new("Untitled"),
        ],
        options: CreateListsOptions::default(),
    };

    let response = harness.service.create_lists(&ctx("req-lists"), request).await;

    assert_eq!(response.status_code(), 201);
    let data = response.data().unwrap();
    assert_eq!(data.summary.successful, 3);
    assert_eq!(data.results[1].parent_list_id.as_deref(), Some("projects"));
    assert!(!data.results[2].id.is_empty());
    assert_eq!(data.results[0].created_by.as_deref(), Some("test-user"));
    assert_eq!(data.results[0].status, ListStatus::Active);
}

#[tokio::test]
async fn test_create_list_with_missing_parent() {
    let harness = TestHarness::empty();
    let request = BulkCreateListsRequest {
        lists: vec![NewList::new("Orphan").with_parent("ghost")],
        options: CreateListsOptions::default(),
    };
    let response = harness.service.create_lists(&ctx("req-orphan"), request).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.data().unwrap().errors[0].code, "NOT_FOUND");

    let request = BulkCreateListsRequest {
        lists: vec![NewList::new("Orphan").with_parent("ghost")],
        options: CreateListsOptions {
            validate_hierarchy: Some(false),
            ..Default::default()
        },
    };
    let response = harness.service.create_lists(&ctx("req-lenient"), request).await;
    assert_eq!(response.status_code(), 201);
}

#[tokio::test]
async fn test_list_batch_bounds() {
    let harness = TestHarness::new(tree_store());
    let request = BulkCreateListsRequest {
        lists: (0..51).map(|i| NewList::new(format!("List {i}"))).collect(),
        options: CreateListsOptions::default(),
    };

    let response = harness.service.create_lists(&ctx("req-bounds"), request).await;

    assert_eq!(response.status_code(), 400);
    assert!(response.data().is_none());
    assert_eq!(harness.store.call_count(), 0);
}

#[tokio::test]
async fn test_move_list_under_itself() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .move_lists(&ctx("req-self"), move_request(&["a"], Some("a")))
        .await;

    assert_eq!(response.status_code(), 400);
    let error = &response.data().unwrap().errors[0];
    assert_eq!(error.code, "CIRCULAR_REFERENCE");
    assert!(error.error.contains("circular reference"));
    assert_eq!(parent_of(&harness.store, "a").await.as_deref(), Some("root"));
}

#[tokio::test]
async fn test_move_list_under_descendant() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .move_lists(&ctx("req-desc"), move_request(&["root", "b"], Some("a1")))
        .await;

    // b moves fine, but a business-rule failure fails the batch
    assert_eq!(response.status_code(), 400);
    let data = response.data().unwrap();
    assert_eq!(data.errors.len(), 1);
    assert_eq!(data.errors[0].index, 0);
    assert_eq!(parent_of(&harness.store, "root").await, None);

    let descendants = harness
        .service
        .hierarchy_validator()
        .descendant_ids("root")
        .await
        .unwrap();
    assert!(!descendants.contains("root"));
}

#[tokio::test]
async fn test_move_lists_to_root_and_missing_target() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .move_lists(&ctx("req-root"), move_request(&["a1"], None))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(parent_of(&harness.store, "a1").await, None);

    let response = harness
        .service
        .move_lists(&ctx("req-missing"), move_request(&["b"], Some("ghost")))
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(parent_of(&harness.store, "b").await.as_deref(), Some("root"));
}

#[tokio::test]
async fn test_move_lists_requires_target_key() {
    let harness = TestHarness::new(tree_store());

    let request = BulkMoveRequest {
        ids: ids(&["a1"]),
        target_list_id: None,
        options: MoveOptions::default(),
    };
    let response = harness.service.move_lists(&ctx("req-no-target"), request).await;

    assert_eq!(response.status_code(), 400);
    assert!(response.data().is_none());
    assert_eq!(parent_of(&harness.store, "a1").await.as_deref(), Some("a"));
}

#[tokio::test]
async fn test_archive_with_active_children_rejected() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .update_list_status(
            &ctx("req-archive"),
            list_status_request(&["a"], ListStatus::Archived, ListStatusOptions::default()),
        )
        .await;

    assert_eq!(response.status_code(), 400);
    let error = &response.data().unwrap().errors[0];
    assert_eq!(error.error, "Cannot archive list with active children");
    assert_eq!(error.details.as_ref().unwrap()["activeLists"][0], "a1");

    let list = harness.store.get_list("a").await.unwrap().unwrap();
    assert_eq!(list.status, ListStatus::Active);
}

#[tokio::test]
async fn test_forced_archive_leaves_children() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .update_list_status(
            &ctx("req-force"),
            list_status_request(
                &["a"],
                ListStatus::Archived,
                ListStatusOptions {
                    force: Some(true),
                    ..Default::default()
                },
            ),
        )
        .await;

    assert_eq!(response.status_code(), 200);
    let outcome = &response.data().unwrap().results[0];
    assert_eq!(outcome.list.status, ListStatus::Archived);
    assert!(outcome.cascaded_lists.is_empty());
    let child = harness.store.get_list("a1").await.unwrap().unwrap();
    assert_eq!(child.status, ListStatus::Active);
}

#[tokio::test]
async fn test_cascade_without_items_still_blocked_by_open_items() {
    let harness = TestHarness::new(tree_store());

    // a1 itself owns an open item
    let response = harness
        .service
        .update_list_status(
            &ctx("req-cascade"),
            list_status_request(
                &["a1"],
                ListStatus::Archived,
                ListStatusOptions {
                    cascade: Some(true),
                    ..Default::default()
                },
            ),
        )
        .await;

    assert_eq!(response.status_code(), 400);
    let error = &response.data().unwrap().errors[0];
    assert_eq!(error.details.as_ref().unwrap()["openItems"][0], "i1");
}

#[tokio::test]
async fn test_cascade_to_items_archives_subtree() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .update_list_status(
            &ctx("req-cascade-items"),
            list_status_request(
                &["a"],
                ListStatus::Archived,
                ListStatusOptions {
                    cascade_to_items: Some(true),
                    ..Default::default()
                },
            ),
        )
        .await;

    assert_eq!(response.status_code(), 200);
    let outcome = &response.data().unwrap().results[0];
    assert_eq!(outcome.cascaded_lists, vec!["a1"]);
    assert_eq!(outcome.cascaded_items, vec!["i1"]);

    let child = harness.store.get_list("a1").await.unwrap().unwrap();
    assert_eq!(child.status, ListStatus::Archived);
    let item = harness.store.get_item("i1").await.unwrap().unwrap();
    assert_eq!(item.status, ItemStatus::Completed);
    assert!(item.completed_at.is_some());

    // sibling untouched
    let sibling = harness.store.get_list("b").await.unwrap().unwrap();
    assert_eq!(sibling.status, ListStatus::Active);
}

#[tokio::test]
async fn test_failed_cascade_leaves_list_untouched() {
    let store = tree_store();
    store.inject_conflict("a");
    let harness = TestHarness::new(store);

    let response = harness
        .service
        .update_list_status(
            &ctx("req-cascade-conflict"),
            list_status_request(
                &["root"],
                ListStatus::Archived,
                ListStatusOptions {
                    cascade: Some(true),
                    cascade_to_items: Some(true),
                    ..Default::default()
                },
            ),
        )
        .await;

    assert_eq!(response.status_code(), 400);
    let error = &response.data().unwrap().errors[0];
    assert_eq!(error.code, "STORE_CONFLICT");
    let applied: Vec<&str> = error.details.as_ref().unwrap()["appliedIds"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|id| id.as_str())
        .collect();
    assert!(applied.contains(&"i1"));
    assert!(applied.contains(&"a1"));
    assert!(!applied.contains(&"root"));

    let root = harness.store.get_list("root").await.unwrap().unwrap();
    assert_eq!(root.status, ListStatus::Active);
    let a = harness.store.get_list("a").await.unwrap().unwrap();
    assert_eq!(a.status, ListStatus::Active);
    let a1 = harness.store.get_list("a1").await.unwrap().unwrap();
    assert_eq!(a1.status, ListStatus::Archived);
}

#[tokio::test]
async fn test_complete_list_sets_timestamp() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .update_list_status(
            &ctx("req-complete"),
            list_status_request(&["b"], ListStatus::Completed, ListStatusOptions::default()),
        )
        .await;

    assert_eq!(response.status_code(), 200);
    let list = &response.data().unwrap().results[0].list;
    assert!(list.completed_at.is_some());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["data"]["results"][0]["id"], "b");
    assert_eq!(json["data"]["results"][0]["status"], "completed");
}

#[tokio::test]
async fn test_update_list_reparent_and_cycle() {
    let harness = TestHarness::new(tree_store());

    let request = BulkUpdateListsRequest {
        updates: vec![
            UpdateEntry {
                id: "b".to_string(),
                data: ListPatch {
                    title: Some("Renamed".to_string()),
                    parent_list_id: Some(Some("a".to_string())),
                    ..Default::default()
                },
            },
            UpdateEntry {
                id: "a".to_string(),
                data: ListPatch {
                    parent_list_id: Some(Some("a1".to_string())),
                    ..Default::default()
                },
            },
        ],
        options: UpdateOptions::default(),
    };

    let response = harness.service.update_lists(&ctx("req-reparent"), request).await;

    assert_eq!(response.status_code(), 207);
    let data = response.data().unwrap();
    assert_eq!(data.results[0].title, "Renamed");
    assert_eq!(data.errors[0].index, 1);
    assert_eq!(data.errors[0].code, "CIRCULAR_REFERENCE");
    assert_eq!(parent_of(&harness.store, "b").await.as_deref(), Some("a"));
    assert_eq!(parent_of(&harness.store, "a").await.as_deref(), Some("root"));
}

#[tokio::test]
async fn test_patch_null_parent_moves_to_root() {
    let harness = TestHarness::new(tree_store());
    let request: BulkUpdateListsRequest = serde_json::from_str(
        r#"{"updates": [{"id": "a1", "data": {"parentListId": null}}]}"#,
    )
    .unwrap();

    let response = harness.service.update_lists(&ctx("req-null"), request).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(parent_of(&harness.store, "a1").await, None);
}

#[tokio::test]
async fn test_delete_list_rules() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .delete_lists(&ctx("req-children"), delete_request(&["a"], DeleteOptions::default()))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.data().unwrap().errors[0].code, "HAS_CHILD_LISTS");

    let response = harness
        .service
        .delete_lists(&ctx("req-items"), delete_request(&["a1"], DeleteOptions::default()))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.data().unwrap().errors[0].code, "HAS_ITEMS");

    let response = harness
        .service
        .delete_lists(
            &ctx("req-delete-items"),
            delete_request(
                &["a1"],
                DeleteOptions {
                    delete_items: Some(true),
                    ..Default::default()
                },
            ),
        )
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.data().unwrap().results[0].removed_items, vec!["i1"]);
    assert!(harness.store.get_list("a1").await.unwrap().is_none());
    assert!(harness.store.get_item("i1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_forced_delete_removes_subtree_bottom_up() {
    let harness = TestHarness::new(tree_store());

    let response = harness
        .service
        .delete_lists(
            &ctx("req-force-delete"),
            delete_request(
                &["root"],
                DeleteOptions {
                    force: Some(true),
                    ..Default::default()
                },
            ),
        )
        .await;

    assert_eq!(response.status_code(), 200);
    let deleted = &response.data().unwrap().results[0];
    assert_eq!(deleted.id, "root");
    assert_eq!(deleted.removed_lists.len(), 3);
    assert_eq!(deleted.removed_lists[0], "a1");
    assert_eq!(deleted.removed_items, vec!["i1"]);
    assert_eq!(harness.store.list_count(), 0);
    assert_eq!(harness.store.item_count(), 0);
}

#[tokio::test]
async fn test_failed_forced_delete_reports_removed_subtree() {
    let store = tree_store();
    store.inject_conflict("root");
    let harness = TestHarness::new(store);

    let response = harness
        .service
        .delete_lists(
            &ctx("req-delete-conflict"),
            delete_request(
                &["root"],
                DeleteOptions {
                    force: Some(true),
                    ..Default::default()
                },
            ),
        )
        .await;

    assert_eq!(response.status_code(), 400);
    let data = response.data().unwrap();
    assert!(data.results.is_empty());
    let error = &data.errors[0];
    assert_eq!(error.code, "STORE_CONFLICT");
    let details = error.details.as_ref().unwrap();
    assert_eq!(details["appliedIds"][0], "i1");
    assert_eq!(details["appliedIds"].as_array().unwrap().len(), 4);

    // root is the last write, so it is the only list left
    assert!(harness.store.get_list("root").await.unwrap().is_some());
    assert_eq!(harness.store.list_count(), 1);
    assert_eq!(harness.store.item_count(), 0);
}

#[tokio::test]
async fn test_breadcrumbs_stable_across_sibling_mutation() {
    let harness = TestHarness::new(tree_store());
    let ids_of = |lists: Vec<tasklist_core::List>| -> Vec<String> {
        lists.into_iter().map(|list| list.id).collect()
    };

    let before = ids_of(harness.service.breadcrumbs("a1").await.unwrap());
    assert_eq!(before, vec!["root", "a"]);

    let request = BulkUpdateListsRequest {
        updates: vec![UpdateEntry {
            id: "b".to_string(),
            data: ListPatch {
                title: Some("Sibling renamed".to_string()),
                ..Default::default()
            },
        }],
        options: UpdateOptions::default(),
    };
    let response = harness.service.update_lists(&ctx("req-sibling"), request).await;
    assert_eq!(response.status_code(), 200);

    let after = ids_of(harness.service.breadcrumbs("a1").await.unwrap());
    assert_eq!(before, after);
    assert!(harness.service.breadcrumbs("root").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_list_aborts_batch() {
    let store = tree_store();
    store.make_unreachable_for("b");
    let harness = TestHarness::new(store);

    let response = harness
        .service
        .update_list_status(
            &ctx("req-unreachable"),
            list_status_request(&["a1", "b"], ListStatus::Completed, ListStatusOptions::default()),
        )
        .await;

    assert_eq!(response.status_code(), 500);
    assert!(response.data().is_none());
    assert_eq!(response.correlation_id, "req-unreachable");
}
