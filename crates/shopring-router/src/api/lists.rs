use actix_web::{HttpResponse, Scope, post, web};
use shopring_api::{
    GetListRequest, Result, ShoppingListData, UpdateListRequest, UpdateListResponse,
    response::{http_error, http_parameter_missing},
};

use crate::model::common::AppState;

/// Forward a list state to its owner
#[post("/update")]
async fn update_list(
    data: web::Data<AppState>,
    body: web::Json<UpdateListRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    if request.list_uuid.trim().is_empty() {
        return http_parameter_missing("listUuid");
    }
    if request.list_content.trim().is_empty() {
        return http_parameter_missing("listContent");
    }

    match data.router.update(request).await {
        Ok(response) => Result::<UpdateListResponse>::http_success(response),
        Err(err) => http_error(&err),
    }
}

#[post("/get")]
async fn get_list(data: web::Data<AppState>, body: web::Json<GetListRequest>) -> HttpResponse {
    if body.list_uuid.trim().is_empty() {
        return http_parameter_missing("listUuid");
    }

    match data.router.get(&body.list_uuid).await {
        Ok(list) => Result::<ShoppingListData>::http_success(list),
        Err(err) => http_error(&err),
    }
}

pub fn routes() -> Scope {
    web::scope("/lists").service(update_list).service(get_list)
}
