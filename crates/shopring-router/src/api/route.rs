use actix_web::{Scope, web};
use shopring_api::response::json_config;
use shopring_common::API_PREFIX;

use super::{health, lists, ring};

pub fn routes() -> Scope {
    web::scope(API_PREFIX)
        .app_data(json_config())
        .service(health::routes())
        .service(lists::routes())
        .service(ring::routes())
}
