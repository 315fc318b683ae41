//! Typed HTTP calls to storage servers and peer routers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shopring_api::{
    GetListRequest, HEALTH_PATH, HealthInfo, KEYS_PATH, KEYS_PURGE_PATH, KEYS_REPLICATE_PATH,
    KeysQuery, KeysResponse, LISTS_GET_PATH, LISTS_REPLICATE_PATH, LISTS_UPDATE_PATH,
    PurgeResponse, RING_PATH, RING_SYNC_PATH, RebalanceResponse, ReplicateKeysResponse,
    ReplicateListRequest, RingSnapshot, ShoppingListData, UpdateListRequest, UpdateListResponse,
    VirtualNode,
};
use shopring_common::{API_PREFIX, ShopringError};
use tracing::debug;

use crate::{http::decode_envelope, replication::ReplicaTransport};

#[derive(Clone, Debug)]
pub struct PeerClient {
    client: Client,
}

impl PeerClient {
    pub fn new(timeout_ms: u64) -> Result<Self, ShopringError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(timeout_ms))
            .timeout(Duration::from_millis(timeout_ms.saturating_mul(3)))
            .no_proxy()
            .build()
            .map_err(|e| ShopringError::NetworkError(e.to_string()))?;
        Ok(Self { client })
    }

    fn url(address: &str, path: &str) -> String {
        format!("{}{}{}", address.trim_end_matches('/'), API_PREFIX, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        address: &str,
        request: RequestBuilder,
    ) -> Result<T, ShopringError> {
        let response = request.send().await.map_err(|e| {
            debug!(address, error = %e, "Peer request failed");
            ShopringError::NodeUnavailable(address.to_string(), e.to_string())
        })?;
        decode_envelope(response).await
    }

    pub async fn health(&self, address: &str) -> Result<HealthInfo, ShopringError> {
        let request = self.client.get(Self::url(address, HEALTH_PATH));
        self.send(address, request).await
    }

    pub async fn update_list(
        &self,
        address: &str,
        body: &UpdateListRequest,
    ) -> Result<UpdateListResponse, ShopringError> {
        let request = self
            .client
            .post(Self::url(address, LISTS_UPDATE_PATH))
            .json(body);
        self.send(address, request).await
    }

    pub async fn get_list(
        &self,
        address: &str,
        body: &GetListRequest,
    ) -> Result<ShoppingListData, ShopringError> {
        let request = self.client.post(Self::url(address, LISTS_GET_PATH)).json(body);
        self.send(address, request).await
    }

    pub async fn replicate_list(
        &self,
        address: &str,
        body: &ReplicateListRequest,
    ) -> Result<ShoppingListData, ShopringError> {
        let request = self
            .client
            .post(Self::url(address, LISTS_REPLICATE_PATH))
            .json(body);
        self.send(address, request).await
    }

    pub async fn keys(
        &self,
        address: &str,
        vnode: VirtualNode,
        level: i32,
    ) -> Result<KeysResponse, ShopringError> {
        let request = self
            .client
            .get(Self::url(address, KEYS_PATH))
            .query(&KeysQuery { vnode, level });
        self.send(address, request).await
    }

    pub async fn install_ring(
        &self,
        address: &str,
        snapshot: &RingSnapshot,
    ) -> Result<RebalanceResponse, ShopringError> {
        let request = self.client.put(Self::url(address, RING_PATH)).json(snapshot);
        self.send(address, request).await
    }

    pub async fn purge_keys(&self, address: &str) -> Result<PurgeResponse, ShopringError> {
        let request = self.client.post(Self::url(address, KEYS_PURGE_PATH));
        self.send(address, request).await
    }

    pub async fn replicate_keys(
        &self,
        address: &str,
    ) -> Result<ReplicateKeysResponse, ShopringError> {
        let request = self.client.post(Self::url(address, KEYS_REPLICATE_PATH));
        self.send(address, request).await
    }

    /// Push a snapshot to a peer router
    pub async fn sync_ring(
        &self,
        address: &str,
        snapshot: &RingSnapshot,
    ) -> Result<RingSnapshot, ShopringError> {
        let request = self
            .client
            .put(Self::url(address, RING_SYNC_PATH))
            .json(snapshot);
        self.send(address, request).await
    }
}

#[async_trait]
impl ReplicaTransport for PeerClient {
    async fn replicate(
        &self,
        address: &str,
        request: &ReplicateListRequest,
    ) -> Result<(), ShopringError> {
        self.replicate_list(address, request).await.map(|_| ())
    }
}
