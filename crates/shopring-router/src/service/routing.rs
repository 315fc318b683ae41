//! Forwarding list requests to the servers that own them

use shopring_api::{
    GetListRequest, RingSnapshot, ShoppingListData, UpdateListRequest, UpdateListResponse,
    VirtualNode,
};
use shopring_common::ShopringError;
use shopring_core::{ClusterView, PeerClient, SharedClusterView};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How far list requests may walk along the ring
#[derive(Clone, Copy, Debug)]
pub struct RoutingSettings {
    pub replicas: usize,
    pub max_walk: usize,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            replicas: 2,
            max_walk: 10,
        }
    }
}

pub struct RouterService {
    cluster: SharedClusterView,
    peers: PeerClient,
    peer_routers: Vec<String>,
    settings: RoutingSettings,
    /// Serializes membership changes
    pub(crate) membership: Mutex<()>,
}

impl RouterService {
    pub fn new(
        cluster: SharedClusterView,
        peers: PeerClient,
        peer_routers: Vec<String>,
        settings: RoutingSettings,
    ) -> Self {
        Self {
            cluster,
            peers,
            peer_routers,
            settings,
            membership: Mutex::new(()),
        }
    }

    pub fn cluster(&self) -> &SharedClusterView {
        &self.cluster
    }

    pub fn snapshot(&self) -> RingSnapshot {
        self.cluster.read().snapshot()
    }

    pub(crate) fn peers(&self) -> &PeerClient {
        &self.peers
    }

    pub(crate) fn peer_routers(&self) -> &[String] {
        &self.peer_routers
    }

    fn view(&self) -> ClusterView {
        self.cluster.read().clone()
    }

    /// Store a list state on its owner, or park it on the next reachable server
    pub async fn update(
        &self,
        request: UpdateListRequest,
    ) -> Result<UpdateListResponse, ShopringError> {
        let view = self.view();
        let primary = view
            .ring()
            .responsible(&request.list_uuid)
            .ok_or(ShopringError::RingEmpty)?;

        let mut forwarded = request;
        forwarded.vnode = Some(primary);
        forwarded.hinted_handoff = None;
        match self.forward_update(&view, primary, &forwarded).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_unavailable() => {
                warn!(
                    list = %forwarded.list_uuid,
                    node = %primary,
                    "Owner unreachable, trying fallbacks"
                );
            }
            Err(e) => return Err(e),
        }

        for candidate in view
            .ring()
            .replica_candidates(&forwarded.list_uuid, self.settings.max_walk)
        {
            forwarded.vnode = Some(candidate);
            forwarded.hinted_handoff = Some(primary);
            match self.forward_update(&view, candidate, &forwarded).await {
                Ok(response) => {
                    info!(
                        list = %forwarded.list_uuid,
                        intended = %primary,
                        stored = %candidate,
                        "Stored hinted list"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_unavailable() => continue,
                Err(e) => return Err(e),
            }
        }

        Err(ShopringError::NodeUnavailable(
            primary.to_string(),
            "no storage server is reachable".to_string(),
        ))
    }

    async fn forward_update(
        &self,
        view: &ClusterView,
        node: VirtualNode,
        request: &UpdateListRequest,
    ) -> Result<UpdateListResponse, ShopringError> {
        let address = view.address_of_node(node).ok_or_else(|| {
            ShopringError::NodeUnavailable(node.to_string(), "no address known".to_string())
        })?;
        self.peers.update_list(address, request).await
    }

    /// Read a list from the first server along its preference list that has it
    pub async fn get(&self, list_uuid: &str) -> Result<ShoppingListData, ShopringError> {
        let view = self.view();
        let ring = view.ring();
        let primary = ring.responsible(list_uuid).ok_or(ShopringError::RingEmpty)?;

        // Hinted copies may sit past the preference list
        let walk = self.settings.max_walk.max(self.settings.replicas);
        let nodes = std::iter::once(primary).chain(ring.replica_candidates(list_uuid, walk));

        let mut failure = None;
        for node in nodes {
            let Some(address) = view.address_of_node(node) else {
                continue;
            };
            let request = GetListRequest {
                list_uuid: list_uuid.to_string(),
                vnode: Some(node),
            };
            match self.peers.get_list(address, &request).await {
                Ok(list) => {
                    debug!(list = list_uuid, node = %node, "Found list");
                    return Ok(list);
                }
                Err(e) if e.is_unavailable() || e.is_not_found() => {
                    debug!(list = list_uuid, node = %node, error = %e, "List not served here");
                }
                Err(e) => {
                    warn!(list = list_uuid, node = %node, error = %e, "Server failed to read list");
                    failure = Some(e);
                }
            }
        }

        // A server that failed may hold the only copy, so that is not a plain 404
        Err(failure.unwrap_or_else(|| ShopringError::ListNotFound(list_uuid.to_string())))
    }
}
