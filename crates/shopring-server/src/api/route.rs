use actix_web::{Scope, web};
use shopring_api::response::{json_config, query_config};
use shopring_common::API_PREFIX;

use super::{health, keys, lists, ring};

pub fn routes() -> Scope {
    web::scope(API_PREFIX)
        .app_data(json_config())
        .app_data(query_config())
        .service(health::routes())
        .service(lists::routes())
        .service(keys::routes())
        .service(ring::routes())
}
