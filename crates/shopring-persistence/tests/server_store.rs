//! Server list storage against an in-memory SQLite database

use shopring_api::VirtualNode;
use shopring_consistency::PnCounterMap;
use shopring_persistence::{
    ServerDbPersistService, ServerListPersistence, connect, init_server_schema,
};

async fn store() -> ServerDbPersistService {
    let db = connect("sqlite::memory:").await.unwrap();
    init_server_schema(&db).await.unwrap();
    ServerDbPersistService::new(db)
}

fn content(item: &str, actor: &str, amount: u64) -> String {
    let mut list = PnCounterMap::new();
    list.insert_with(item, actor, amount);
    list.to_json().unwrap()
}

#[tokio::test]
async fn test_create_and_find() {
    let store = store().await;
    let vnode = VirtualNode::new(1, 2);

    assert!(!store.list_exists("u-1", vnode).await.unwrap());
    let row = store
        .list_create(vnode, "u-1", Some("groceries"), &content("milk", "alice", 2))
        .await
        .unwrap();
    assert_eq!(row.vnode, vnode);
    assert_eq!(row.level, 0);
    assert!(row.is_primary());

    assert!(store.list_exists("u-1", vnode).await.unwrap());
    let found = store.list_find("u-1", vnode).await.unwrap().unwrap();
    assert_eq!(found.list_name.as_deref(), Some("groceries"));
    assert!(
        store
            .list_find("u-1", VirtualNode::new(1, 0))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_merge_content() {
    let store = store().await;
    let vnode = VirtualNode::new(1, 0);
    store
        .list_create(vnode, "u-1", None, &content("milk", "alice", 2))
        .await
        .unwrap();

    let merged = store
        .list_merge_content(vnode, "u-1", &content("bread", "bob", 1))
        .await
        .unwrap()
        .unwrap();
    let list = PnCounterMap::from_json(&merged.list_content).unwrap();
    assert_eq!(list.value("milk"), 2);
    assert_eq!(list.value("bread"), 1);

    assert!(
        store
            .list_merge_content(vnode, "missing", "{}")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .list_merge_content(vnode, "u-1", "not json")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_upsert_replica_and_levels() {
    let store = store().await;
    let vnode = VirtualNode::new(2, 1);

    let row = store
        .list_upsert_replica(vnode, "u-1", Some("party"), &content("cake", "a", 1), 1, None)
        .await
        .unwrap();
    assert_eq!(row.level, 1);

    let row = store
        .list_upsert_replica(vnode, "u-1", None, &content("cake", "b", 2), 2, None)
        .await
        .unwrap();
    assert_eq!(row.level, 2);
    assert_eq!(row.list_name.as_deref(), Some("party"));
    assert_eq!(
        PnCounterMap::from_json(&row.list_content)
            .unwrap()
            .value("cake"),
        3
    );

    assert_eq!(store.keys_by_level(vnode, 2).await.unwrap().len(), 1);
    assert!(store.keys_by_level(vnode, 1).await.unwrap().is_empty());

    assert!(store.update_replication_level(vnode, "u-1", 0).await.unwrap());
    assert_eq!(store.keys_all_by_level(0).await.unwrap().len(), 1);

    assert!(
        store
            .list_upsert_replica(vnode, "u-2", None, "[1,2]", 1, None)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_hinted_rows_are_not_keys() {
    let store = store().await;
    let stored_at = VirtualNode::new(3, 0);
    let intended = VirtualNode::new(4, 1);

    let row = store
        .list_upsert_replica(stored_at, "u-1", None, "{}", 1, Some(intended))
        .await
        .unwrap();
    assert_eq!(row.hinted_handoff, Some(intended));

    assert!(store.keys_by_level(stored_at, 1).await.unwrap().is_empty());
    let hinted = store.hinted_rows().await.unwrap();
    assert_eq!(hinted.len(), 1);
    assert_eq!(hinted[0].hinted_handoff, Some(intended));

    assert!(store.list_set_hint(row.id, None).await.unwrap());
    assert!(store.hinted_rows().await.unwrap().is_empty());
    assert_eq!(store.keys_by_level(stored_at, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_mark_and_purge() {
    let store = store().await;
    let a = VirtualNode::new(1, 0);
    let b = VirtualNode::new(1, 1);

    let first = store.list_create(a, "u-1", None, "{}").await.unwrap();
    store.list_create(b, "u-2", None, "{}").await.unwrap();
    store
        .list_upsert_replica(b, "u-3", None, "{}", 1, None)
        .await
        .unwrap();

    assert_eq!(store.list_mark_to_delete(b, "u-2").await.unwrap(), 1);
    assert!(store.list_mark_row_to_delete(first.id).await.unwrap());

    assert!(store.list_find("u-2", b).await.unwrap().is_none());
    assert!(store.list_find_any("u-1").await.unwrap().is_none());
    assert_eq!(store.all_live_rows().await.unwrap().len(), 1);

    assert_eq!(store.purge_marked().await.unwrap(), 2);
    assert_eq!(store.purge_marked().await.unwrap(), 0);
}

#[tokio::test]
async fn test_find_any_prefers_primary() {
    let store = store().await;
    store
        .list_upsert_replica(VirtualNode::new(2, 0), "u-1", None, "{}", 1, None)
        .await
        .unwrap();
    store
        .list_create(VirtualNode::new(1, 0), "u-1", None, "{}")
        .await
        .unwrap();

    let row = store.list_find_any("u-1").await.unwrap().unwrap();
    assert_eq!(row.level, 0);
    assert_eq!(row.vnode, VirtualNode::new(1, 0));
}

#[tokio::test]
async fn test_hinted_and_unhinted_rows_kept_apart() {
    let store = store().await;
    let vnode = VirtualNode::new(1, 0);
    let intended = VirtualNode::new(2, 1);

    let own = store
        .list_upsert_replica(vnode, "u-1", None, &content("milk", "alice", 2), 1, None)
        .await
        .unwrap();
    let parked = store
        .list_upsert_replica(vnode, "u-1", None, &content("bread", "bob", 1), 0, Some(intended))
        .await
        .unwrap();
    assert_ne!(own.id, parked.id);

    // Lookups without a hint only see the row this server keeps for itself
    let found = store.list_find("u-1", vnode).await.unwrap().unwrap();
    assert_eq!(found.id, own.id);
    assert_eq!(found.level, 1);

    let merged = store
        .list_merge_content(vnode, "u-1", &content("eggs", "carol", 3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(merged.id, own.id);

    assert_eq!(store.list_mark_to_delete(vnode, "u-1").await.unwrap(), 1);
    let hinted = store.hinted_rows().await.unwrap();
    assert_eq!(hinted.len(), 1);
    assert_eq!(hinted[0].id, parked.id);
    let waiting = PnCounterMap::from_json(&hinted[0].list_content).unwrap();
    assert_eq!(waiting.value("bread"), 1);
    assert_eq!(waiting.value("eggs"), 0);
}

#[tokio::test]
async fn test_high_server_ids_load() {
    let store = store().await;
    let vnode = VirtualNode::new(u32::MAX, 2);
    store.list_create(vnode, "u-1", None, "{}").await.unwrap();

    let row = store.list_find("u-1", vnode).await.unwrap().unwrap();
    assert_eq!(row.vnode, vnode);
    assert_eq!(store.all_live_rows().await.unwrap().len(), 1);
}
