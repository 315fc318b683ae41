use actix_web::{HttpResponse, Scope, get, post, put, web};
use shopring_api::{JoinRequest, LeaveRequest, Result, RingSnapshot, response::http_error};

use crate::model::common::AppState;

#[get("")]
async fn ring(data: web::Data<AppState>) -> HttpResponse {
    Result::<RingSnapshot>::http_success(data.router.snapshot())
}

#[post("/join")]
async fn join(data: web::Data<AppState>, body: web::Json<JoinRequest>) -> HttpResponse {
    match data.router.join(body.into_inner()).await {
        Ok(snapshot) => Result::<RingSnapshot>::http_success(snapshot),
        Err(err) => http_error(&err),
    }
}

#[post("/leave")]
async fn leave(data: web::Data<AppState>, body: web::Json<LeaveRequest>) -> HttpResponse {
    match data.router.leave(body.server_id).await {
        Ok(snapshot) => Result::<RingSnapshot>::http_success(snapshot),
        Err(err) => http_error(&err),
    }
}

/// Ring pushed by a peer router
#[put("/sync")]
async fn sync(data: web::Data<AppState>, body: web::Json<RingSnapshot>) -> HttpResponse {
    Result::<RingSnapshot>::http_success(data.router.sync(&body))
}

pub fn routes() -> Scope {
    web::scope("/ring")
        .service(ring)
        .service(join)
        .service(leave)
        .service(sync)
}
