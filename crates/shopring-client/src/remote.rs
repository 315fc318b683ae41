//! Talking to the cluster through any live router

use shopring_api::{
    GetListRequest, LISTS_GET_PATH, LISTS_UPDATE_PATH, ShoppingListData, UpdateListRequest,
    UpdateListResponse,
};
use shopring_common::ShopringError;
use shopring_core::{FailoverHttpClient, HttpClientConfig};

pub struct RouterClient {
    http: FailoverHttpClient,
}

impl RouterClient {
    pub fn new(addresses: Vec<String>, timeout_ms: u64) -> Result<Self, ShopringError> {
        let config = HttpClientConfig::with_servers(addresses)
            .with_timeouts(timeout_ms, timeout_ms.saturating_mul(5));
        Ok(Self {
            http: FailoverHttpClient::new(config)?,
        })
    }

    pub fn current_router(&self) -> String {
        self.http.current_server()
    }

    pub async fn update_list(
        &self,
        list_uuid: &str,
        list_name: &str,
        list_content: &str,
    ) -> Result<UpdateListResponse, ShopringError> {
        let request = UpdateListRequest {
            list_uuid: list_uuid.to_string(),
            list_name: Some(list_name.to_string()),
            list_content: list_content.to_string(),
            ..Default::default()
        };
        self.http.post_json(LISTS_UPDATE_PATH, &request).await
    }

    pub async fn get_list(&self, list_uuid: &str) -> Result<ShoppingListData, ShopringError> {
        let request = GetListRequest {
            list_uuid: list_uuid.to_string(),
            vnode: None,
        };
        self.http.post_json(LISTS_GET_PATH, &request).await
    }
}
