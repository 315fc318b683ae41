use actix_web::{HttpResponse, Scope, get, put, web};
use shopring_api::{RebalanceResponse, Result, RingSnapshot, response::http_failure};

use crate::model::common::AppState;

#[get("")]
async fn ring(data: web::Data<AppState>) -> HttpResponse {
    let snapshot = data.storage.cluster().read().snapshot();
    Result::<RingSnapshot>::http_success(snapshot)
}

/// Install a new ring and move stored lists to match it
#[put("")]
async fn install(data: web::Data<AppState>, body: web::Json<RingSnapshot>) -> HttpResponse {
    match data.storage.install_ring(&body).await {
        Ok(result) => Result::<RebalanceResponse>::http_success(result),
        Err(err) => http_failure(&err),
    }
}

pub fn routes() -> Scope {
    web::scope("/ring").service(ring).service(install)
}
