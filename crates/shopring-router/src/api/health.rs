use actix_web::{Responder, Scope, get, web};
use shopring_api::{HealthInfo, Result};

#[get("")]
async fn health() -> impl Responder {
    Result::<HealthInfo>::http_success(HealthInfo::router())
}

pub fn routes() -> Scope {
    web::scope("/health").service(health)
}
