use actix_web::{HttpResponse, Scope, get, post, web};
use shopring_api::{
    KeysQuery, KeysResponse, PurgeResponse, ReplicateKeysResponse, Result, response::http_failure,
};

use crate::model::common::AppState;

#[get("")]
async fn keys(data: web::Data<AppState>, params: web::Query<KeysQuery>) -> HttpResponse {
    match data.storage.keys(params.vnode, params.level).await {
        Ok(keys) => Result::<KeysResponse>::http_success(keys),
        Err(err) => http_failure(&err),
    }
}

#[post("/purge")]
async fn purge(data: web::Data<AppState>) -> HttpResponse {
    match data.storage.purge().await {
        Ok(purged) => Result::<PurgeResponse>::http_success(PurgeResponse { purged }),
        Err(err) => http_failure(&err),
    }
}

#[post("/replicate")]
async fn replicate(data: web::Data<AppState>) -> HttpResponse {
    match data.storage.replicate_all().await {
        Ok(replicated) => {
            Result::<ReplicateKeysResponse>::http_success(ReplicateKeysResponse { replicated })
        }
        Err(err) => http_failure(&err),
    }
}

pub fn routes() -> Scope {
    web::scope("/keys")
        .service(keys)
        .service(purge)
        .service(replicate)
}
