//! A router in front of live storage servers

use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, dev::ServerHandle, web};
use shopring_api::{JoinRequest, UpdateListRequest};
use shopring_common::{ShopringError, error};
use shopring_consistency::PnCounterMap;
use shopring_core::{ClusterView, PeerClient};
use shopring_persistence::{ServerDbPersistService, connect, init_server_schema};
use shopring_router::service::{RouterService, RoutingSettings};
use shopring_server::{
    api::route::routes as server_routes,
    model::common::AppState as ServerState,
    service::{ReplicationSettings, StorageService},
};

struct Node {
    id: u32,
    address: String,
    handle: ServerHandle,
    storage: Arc<StorageService>,
}

async fn spawn_server(id: u32) -> Node {
    let db = connect("sqlite::memory:").await.unwrap();
    init_server_schema(&db).await.unwrap();
    let storage = Arc::new(StorageService::new(
        id,
        Arc::new(ServerDbPersistService::new(db)),
        ClusterView::new(3).shared(),
        PeerClient::new(300).unwrap(),
        ReplicationSettings::default(),
    ));

    let state = Arc::new(ServerState::new(storage.clone()));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(state.clone()))
            .service(server_routes())
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let address = format!("http://{}", server.addrs()[0]);
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Node {
        id,
        address,
        handle,
        storage,
    }
}

async fn cluster(servers: u32) -> (Arc<RouterService>, Vec<Node>) {
    let mut nodes = Vec::new();
    for id in 1..=servers {
        nodes.push(spawn_server(id).await);
    }

    let mut view = ClusterView::new(3);
    for node in &nodes {
        view.add_member(node.id, &node.address);
    }
    view.bump_version();
    let router = Arc::new(RouterService::new(
        view.shared(),
        PeerClient::new(300).unwrap(),
        Vec::new(),
        RoutingSettings::default(),
    ));
    assert_eq!(router.push_snapshot().await, servers as usize);
    (router, nodes)
}

fn list_with(item: &str, actor: &str, amount: u64) -> String {
    let mut list = PnCounterMap::new();
    list.insert_with(item, actor, amount);
    list.to_json().unwrap()
}

#[actix_web::test]
async fn test_update_and_get_through_router() {
    let (router, _nodes) = cluster(3).await;

    let response = router
        .update(UpdateListRequest {
            list_uuid: "9b2f0c4e-groceries".to_string(),
            list_name: Some("groceries".to_string()),
            list_content: list_with("milk", "alice", 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(response.message.starts_with("Created list in server"));
    assert!(response.hinted_handoff.is_none());

    router
        .update(UpdateListRequest {
            list_uuid: "9b2f0c4e-groceries".to_string(),
            list_content: list_with("bread", "bob", 1),
            ..Default::default()
        })
        .await
        .unwrap();

    let list = router.get("9b2f0c4e-groceries").await.unwrap();
    let content = PnCounterMap::from_json(&list.list_content).unwrap();
    assert_eq!(content.value("milk"), 2);
    assert_eq!(content.value("bread"), 1);
    assert_eq!(list.level, 0);

    assert!(router.get("unknown").await.unwrap_err().is_not_found());
}

#[actix_web::test]
async fn test_owner_down_stores_hinted_copy() {
    let (router, nodes) = cluster(3).await;
    let uuid = "4d1e-party";
    let primary = router.cluster().read().ring().responsible(uuid).unwrap();

    let owner = nodes.iter().find(|n| n.id == primary.server_id).unwrap();
    owner.handle.stop(false).await;

    let response = router
        .update(UpdateListRequest {
            list_uuid: uuid.to_string(),
            list_content: list_with("cake", "carol", 1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(response.hinted_handoff, Some(primary));
    assert_ne!(response.list.vnode.server_id, primary.server_id);

    // The parked copy is still readable through the router
    let list = router.get(uuid).await.unwrap();
    assert_eq!(
        PnCounterMap::from_json(&list.list_content)
            .unwrap()
            .value("cake"),
        1
    );
}

#[actix_web::test]
async fn test_join_moves_lists_to_new_server() {
    let (router, nodes) = cluster(2).await;
    let newcomer = spawn_server(3).await;

    let uuids: Vec<String> = (0..20).map(|i| format!("list-{}", i)).collect();
    for uuid in &uuids {
        router
            .update(UpdateListRequest {
                list_uuid: uuid.clone(),
                list_content: list_with("apples", "dave", 3),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let snapshot = router
        .join(JoinRequest {
            server_id: 3,
            address: newcomer.address.clone(),
        })
        .await
        .unwrap();
    assert_eq!(snapshot.version, 2);
    assert_eq!(newcomer.storage.cluster().read().version(), 2);
    for node in &nodes {
        assert_eq!(node.storage.cluster().read().version(), 2);
    }

    let view = ClusterView::from_snapshot(&snapshot);
    let moved: Vec<&String> = uuids
        .iter()
        .filter(|uuid| view.ring().responsible(uuid).unwrap().server_id == 3)
        .collect();
    assert!(!moved.is_empty());

    for uuid in moved {
        let list = router.get(uuid).await.unwrap();
        assert_eq!(list.vnode.server_id, 3);
        assert_eq!(list.level, 0);
    }
}

/// A server whose database is broken: every read answers 500
async fn spawn_failing_server() -> String {
    let server = HttpServer::new(|| {
        App::new().route(
            "/shopring/v1/lists/get",
            web::post().to(|| async {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "code": error::SERVER_ERROR.code,
                    "message": "database is locked",
                    "data": null,
                }))
            }),
        )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let address = format!("http://{}", server.addrs()[0]);
    actix_web::rt::spawn(server.run());
    address
}

fn router_over(view: ClusterView) -> RouterService {
    RouterService::new(
        view.shared(),
        PeerClient::new(300).unwrap(),
        Vec::new(),
        RoutingSettings::default(),
    )
}

#[actix_web::test]
async fn test_get_skips_failing_server() {
    let broken = spawn_failing_server().await;
    let healthy = [spawn_server(2).await, spawn_server(3).await];

    let mut view = ClusterView::new(3);
    view.add_member(1, &broken);
    for node in &healthy {
        view.add_member(node.id, &node.address);
    }
    view.bump_version();

    let uuid = (0..1000)
        .map(|i| format!("list-{}", i))
        .find(|key| view.ring().responsible(key).unwrap().server_id == 1)
        .unwrap();
    let next = view.ring().replica_candidates(&uuid, 10)[0];
    let holder = healthy.iter().find(|n| n.id == next.server_id).unwrap();
    holder
        .storage
        .update(UpdateListRequest {
            list_uuid: uuid.clone(),
            list_content: list_with("soap", "erin", 2),
            vnode: Some(next),
            ..Default::default()
        })
        .await
        .unwrap();

    let router = router_over(view);
    let list = router.get(&uuid).await.unwrap();
    assert_eq!(list.vnode, next);
    assert_eq!(
        PnCounterMap::from_json(&list.list_content)
            .unwrap()
            .value("soap"),
        2
    );
}

#[actix_web::test]
async fn test_get_reports_server_failure_over_not_found() {
    let broken = spawn_failing_server().await;
    let mut view = ClusterView::new(3);
    view.add_member(1, &broken);
    view.bump_version();

    let err = router_over(view).get("list-1").await.unwrap_err();
    assert!(!err.is_not_found());
    assert!(matches!(err, ShopringError::ApiError(code, _) if code == error::SERVER_ERROR.code));
}
