use actix_web::{HttpResponse, Scope, post, web};
use shopring_api::{
    GetListRequest, ReplicateListRequest, Result, ShoppingListData, UpdateListRequest,
    UpdateListResponse,
    response::{http_failure, http_parameter_missing},
};
use tracing::warn;

use crate::model::common::AppState;

fn missing_list_fields(list_uuid: &str, list_content: Option<&str>) -> Option<HttpResponse> {
    if list_uuid.trim().is_empty() {
        return Some(http_parameter_missing("listUuid"));
    }
    if list_content.is_some_and(|c| c.trim().is_empty()) {
        return Some(http_parameter_missing("listContent"));
    }
    None
}

#[post("/update")]
async fn update_list(
    data: web::Data<AppState>,
    body: web::Json<UpdateListRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let content = Some(request.list_content.as_str());
    if let Some(response) = missing_list_fields(&request.list_uuid, content) {
        return response;
    }

    match data.storage.update(request).await {
        Ok(response) => {
            if response.hinted_handoff.is_none() {
                let storage = data.storage.clone();
                let list = response.list.clone();
                actix_web::rt::spawn(async move {
                    let outcome = storage.replicate(&list).await;
                    if !outcome.missed.is_empty() {
                        warn!(
                            list = %list.list_uuid,
                            missed = outcome.missed.len(),
                            "Some replicas were not stored"
                        );
                    }
                });
            }
            Result::<UpdateListResponse>::http_success(response)
        }
        Err(err) => http_failure(&err),
    }
}

#[post("/get")]
async fn get_list(data: web::Data<AppState>, body: web::Json<GetListRequest>) -> HttpResponse {
    let request = body.into_inner();
    if let Some(response) = missing_list_fields(&request.list_uuid, None) {
        return response;
    }

    match data.storage.get(request).await {
        Ok(list) => Result::<ShoppingListData>::http_success(list),
        Err(err) => http_failure(&err),
    }
}

#[post("/replicate")]
async fn replicate_list(
    data: web::Data<AppState>,
    body: web::Json<ReplicateListRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let content = Some(request.list_content.as_str());
    if let Some(response) = missing_list_fields(&request.list_uuid, content) {
        return response;
    }

    match data.storage.store_replica(request).await {
        Ok(list) => Result::<ShoppingListData>::http_success(list),
        Err(err) => http_failure(&err),
    }
}

pub fn routes() -> Scope {
    web::scope("/lists")
        .service(update_list)
        .service(get_list)
        .service(replicate_list)
}
