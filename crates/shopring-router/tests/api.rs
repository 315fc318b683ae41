//! Router HTTP API against a ring whose servers are unreachable

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use serde_json::{Value, json};
use shopring_core::{ClusterView, PeerClient};
use shopring_router::{
    api::route::routes,
    model::common::AppState,
    service::{RouterService, RoutingSettings},
};

fn router(servers: &[u32]) -> Arc<RouterService> {
    let mut view = ClusterView::new(3);
    for id in servers {
        // Nothing listens on these ports
        view.add_member(*id, &format!("http://127.0.0.1:{}", *id));
    }
    view.bump_version();
    Arc::new(RouterService::new(
        view.shared(),
        PeerClient::new(200).unwrap(),
        Vec::new(),
        RoutingSettings::default(),
    ))
}

macro_rules! app {
    ($router:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($router.clone())))
                .service(routes()),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let router = router(&[]);
    let app = app!(router);

    let req = test::TestRequest::get()
        .uri("/shopring/v1/health")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["role"], "router");
    assert!(body["data"].get("id").is_none());
}

#[actix_web::test]
async fn test_update_on_empty_ring() {
    let router = router(&[]);
    let app = app!(router);

    let req = test::TestRequest::post()
        .uri("/shopring/v1/lists/update")
        .set_json(json!({ "listUuid": "u-1", "listContent": "{}" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 23003);
}

#[actix_web::test]
async fn test_update_with_every_server_down() {
    let router = router(&[1, 2, 3]);
    let app = app!(router);

    let req = test::TestRequest::post()
        .uri("/shopring/v1/lists/update")
        .set_json(json!({ "listUuid": "u-1", "listContent": "{}" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 23002);

    let req = test::TestRequest::post()
        .uri("/shopring/v1/lists/get")
        .set_json(json!({ "listUuid": "u-1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_update_requires_fields() {
    let router = router(&[1]);
    let app = app!(router);

    let req = test::TestRequest::post()
        .uri("/shopring/v1/lists/update")
        .set_json(json!({ "listUuid": "u-1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 10000);
}

#[actix_web::test]
async fn test_ring_sync_keeps_newest() {
    let router = router(&[1, 2]);
    let app = app!(router);

    let req = test::TestRequest::get().uri("/shopring/v1/ring").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["version"], 1);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 2);

    let newer = json!({
        "version": 7,
        "vnodesPerServer": 3,
        "members": [{ "id": 4, "address": "http://127.0.0.1:4" }],
    });
    let req = test::TestRequest::put()
        .uri("/shopring/v1/ring/sync")
        .set_json(&newer)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["version"], 7);
    assert_eq!(body["data"]["members"][0]["id"], 4);

    let older = json!({ "version": 2, "vnodesPerServer": 3, "members": [] });
    let req = test::TestRequest::put()
        .uri("/shopring/v1/ring/sync")
        .set_json(&older)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["version"], 7);
}

#[actix_web::test]
async fn test_join_and_leave() {
    let router = router(&[1, 2]);
    let app = app!(router);

    let req = test::TestRequest::post()
        .uri("/shopring/v1/ring/join")
        .set_json(json!({ "serverId": 3, "address": "http://127.0.0.1:3" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["version"], 2);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 3);
    assert!(router.cluster().read().contains(3));

    let req = test::TestRequest::post()
        .uri("/shopring/v1/ring/leave")
        .set_json(json!({ "serverId": 9 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 20004);

    let req = test::TestRequest::post()
        .uri("/shopring/v1/ring/leave")
        .set_json(json!({ "serverId": 1 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["version"], 3);
    assert!(!router.cluster().read().contains(1));
}

#[actix_web::test]
async fn test_join_requires_address() {
    let router = router(&[1]);
    let app = app!(router);

    let req = test::TestRequest::post()
        .uri("/shopring/v1/ring/join")
        .set_json(json!({ "serverId": 3, "address": " " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
