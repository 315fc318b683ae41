//! Two users sharing a list through a live router and storage servers

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use shopring_client::{LocalStore, RouterClient, ShoppingSession, SyncStatus};
use shopring_core::{ClusterView, PeerClient};
use shopring_persistence::{ServerDbPersistService, connect, init_server_schema};
use shopring_router::{
    api::route::routes as router_routes,
    model::common::AppState as RouterState,
    service::{RouterService, RoutingSettings},
};
use shopring_server::{
    api::route::routes as server_routes,
    model::common::AppState as ServerState,
    service::{ReplicationSettings, StorageService},
};

async fn spawn_server(id: u32) -> String {
    let db = connect("sqlite::memory:").await.unwrap();
    init_server_schema(&db).await.unwrap();
    let storage = Arc::new(StorageService::new(
        id,
        Arc::new(ServerDbPersistService::new(db)),
        ClusterView::new(3).shared(),
        PeerClient::new(300).unwrap(),
        ReplicationSettings::default(),
    ));

    let state = Arc::new(ServerState::new(storage));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(state.clone()))
            .service(server_routes())
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let address = format!("http://{}", server.addrs()[0]);
    actix_web::rt::spawn(server.run());
    address
}

/// Three storage servers behind one router; returns the router address
async fn spawn_cluster() -> String {
    let mut view = ClusterView::new(3);
    for id in 1..=3 {
        let address = spawn_server(id).await;
        view.add_member(id, &address);
    }
    view.bump_version();

    let router = Arc::new(RouterService::new(
        view.shared(),
        PeerClient::new(300).unwrap(),
        Vec::new(),
        RoutingSettings::default(),
    ));
    assert_eq!(router.push_snapshot().await, 3);

    let state = Arc::new(RouterState::new(router));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(state.clone()))
            .service(router_routes())
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let address = format!("http://{}", server.addrs()[0]);
    actix_web::rt::spawn(server.run());
    address
}

async fn session(user: &str, routers: Vec<String>) -> ShoppingSession {
    let store = LocalStore::in_memory().await.unwrap();
    ShoppingSession::new(user, store, RouterClient::new(routers, 500).unwrap())
}

#[actix_web::test]
async fn test_shared_list_converges() {
    let router = spawn_cluster().await;
    let alice = session("alice", vec![router.clone()]).await;
    let bob = session("bob", vec![router]).await;

    let uuid = alice.create_list("groceries").await.unwrap();
    assert_eq!(
        alice.add_product(&uuid, "milk", 2).await.unwrap(),
        SyncStatus::Synced
    );

    let downloaded = bob.download(&uuid).await.unwrap();
    assert_eq!(downloaded.name, "groceries");
    assert_eq!(
        bob.products(&uuid).await.unwrap(),
        vec![("milk".to_string(), 2)]
    );

    // Concurrent edits on both devices
    bob.add_product(&uuid, "bread", 1).await.unwrap();
    alice.update_product(&uuid, "milk", 3).await.unwrap();

    assert_eq!(bob.sync(&uuid).await.unwrap(), SyncStatus::Synced);
    assert_eq!(alice.sync(&uuid).await.unwrap(), SyncStatus::Synced);

    let expected = vec![("bread".to_string(), 1), ("milk".to_string(), 3)];
    assert_eq!(alice.products(&uuid).await.unwrap(), expected);
    assert_eq!(bob.products(&uuid).await.unwrap(), expected);
}

#[actix_web::test]
async fn test_removal_wins_over_stale_copy() {
    let router = spawn_cluster().await;
    let alice = session("alice", vec![router.clone()]).await;
    let bob = session("bob", vec![router]).await;

    let uuid = alice.create_list("party").await.unwrap();
    alice.add_product(&uuid, "chips", 4).await.unwrap();
    bob.download(&uuid).await.unwrap();

    alice.remove_product(&uuid, "chips").await.unwrap();
    // Bob pushes his older copy; the merge keeps Alice's removal
    bob.sync(&uuid).await.unwrap();
    assert!(bob.products(&uuid).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_client_fails_over_to_next_router() {
    let router = spawn_cluster().await;
    let carol = session("carol", vec!["http://127.0.0.1:9".to_string(), router]).await;

    let uuid = carol.create_list("hardware").await.unwrap();
    assert_eq!(
        carol.add_product(&uuid, "nails", 50).await.unwrap(),
        SyncStatus::Synced
    );
}

#[actix_web::test]
async fn test_unknown_list_is_not_found() {
    let router = spawn_cluster().await;
    let dave = session("dave", vec![router]).await;
    assert!(dave.download("0c3b-missing").await.is_err());
    assert!(dave.lists().await.unwrap().is_empty());
}
