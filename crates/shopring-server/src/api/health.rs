use actix_web::{Responder, Scope, get, web};
use shopring_api::{HealthInfo, Result};

use crate::model::common::AppState;

#[get("")]
async fn health(data: web::Data<AppState>) -> impl Responder {
    Result::<HealthInfo>::http_success(HealthInfo::server(data.server_id()))
}

pub fn routes() -> Scope {
    web::scope("/health").service(health)
}
