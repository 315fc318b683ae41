//! List storage, replication and ring rebalancing for one server

use std::sync::Arc;

use anyhow::Context;
use shopring_api::{
    GetListRequest, KeysResponse, RebalanceResponse, ReplicateListRequest, RingSnapshot,
    ShoppingListData, UpdateListRequest, UpdateListResponse, VirtualNode,
};
use shopring_common::ShopringError;
use shopring_consistency::PnCounterMap;
use shopring_core::{ClusterView, PeerClient, ReplicationOutcome, ReplicationPlan, SharedClusterView};
use shopring_persistence::{ServerListPersistence, ServerListRow};
use tracing::{debug, info, warn};

/// Replication settings taken from the cluster configuration
#[derive(Clone, Copy, Debug)]
pub struct ReplicationSettings {
    pub replicas: usize,
    pub max_walk: usize,
}

impl Default for ReplicationSettings {
    fn default() -> Self {
        Self {
            replicas: 2,
            max_walk: 10,
        }
    }
}

pub struct StorageService {
    server_id: u32,
    persistence: Arc<dyn ServerListPersistence>,
    cluster: SharedClusterView,
    peers: PeerClient,
    settings: ReplicationSettings,
}

fn require(value: &str, name: &str) -> Result<(), ShopringError> {
    if value.trim().is_empty() {
        return Err(ShopringError::IllegalArgument(format!(
            "Required parameter '{}' is missing",
            name
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), ShopringError> {
    PnCounterMap::from_json(content).map(|_| ())
}

impl StorageService {
    pub fn new(
        server_id: u32,
        persistence: Arc<dyn ServerListPersistence>,
        cluster: SharedClusterView,
        peers: PeerClient,
        settings: ReplicationSettings,
    ) -> Self {
        Self {
            server_id,
            persistence,
            cluster,
            peers,
            settings,
        }
    }

    pub fn server_id(&self) -> u32 {
        self.server_id
    }

    pub fn cluster(&self) -> &SharedClusterView {
        &self.cluster
    }

    pub(crate) fn persistence(&self) -> &Arc<dyn ServerListPersistence> {
        &self.persistence
    }

    pub(crate) fn peers(&self) -> &PeerClient {
        &self.peers
    }

    fn view(&self) -> ClusterView {
        self.cluster.read().clone()
    }

    /// Node owning `list_uuid`, or a node of this server when the ring is not known yet
    fn owner_of(&self, list_uuid: &str) -> Result<VirtualNode, ShopringError> {
        let cluster = self.cluster.read();
        match cluster.ring().responsible(list_uuid) {
            Some(node) => Ok(node),
            None if cluster.is_empty() => Err(ShopringError::RingEmpty),
            None => Ok(VirtualNode::new(self.server_id, 0)),
        }
    }

    // ========================================================================
    // List operations
    // ========================================================================

    /// Merge an incoming list state into the stored copy, creating it if needed.
    ///
    /// Hinted copies are parked as level-0 rows and are not replicated; the
    /// owner replicates them once handoff delivers them.
    pub async fn update(&self, request: UpdateListRequest) -> anyhow::Result<UpdateListResponse> {
        require(&request.list_uuid, "listUuid")?;
        require(&request.list_content, "listContent")?;
        validate_content(&request.list_content)?;

        let vnode = match request.vnode {
            Some(vnode) => vnode,
            None => self.owner_of(&request.list_uuid)?,
        };

        if let Some(hint) = request.hinted_handoff {
            let row = self
                .persistence
                .list_upsert_replica(
                    vnode,
                    &request.list_uuid,
                    request.list_name.as_deref(),
                    &request.list_content,
                    0,
                    Some(hint),
                )
                .await?;
            info!(list = %row.list_uuid, stored = %vnode, intended = %hint, "Stored hinted list");
            return Ok(UpdateListResponse {
                message: format!("Stored hinted list in server {}", self.server_id),
                list: row.to_data(),
                hinted_handoff: Some(hint),
            });
        }

        let merged = self
            .persistence
            .list_merge_content(vnode, &request.list_uuid, &request.list_content)
            .await?;
        let (row, message) = match merged {
            Some(row) => (row, format!("Updated list in server {}", self.server_id)),
            None => {
                let row = self
                    .persistence
                    .list_create(
                        vnode,
                        &request.list_uuid,
                        request.list_name.as_deref(),
                        &request.list_content,
                    )
                    .await?;
                (row, format!("Created list in server {}", self.server_id))
            }
        };
        debug!(list = %row.list_uuid, vnode = %vnode, "{}", message);

        Ok(UpdateListResponse {
            message,
            list: row.to_data(),
            hinted_handoff: None,
        })
    }

    pub async fn get(&self, request: GetListRequest) -> anyhow::Result<ShoppingListData> {
        require(&request.list_uuid, "listUuid")?;

        if let Some(vnode) = request.vnode
            && let Some(row) = self.persistence.list_find(&request.list_uuid, vnode).await?
        {
            return Ok(row.to_data());
        }

        match self.persistence.list_find_any(&request.list_uuid).await? {
            Some(row) => Ok(row.to_data()),
            None => Err(ShopringError::ListNotFound(request.list_uuid).into()),
        }
    }

    /// Store a copy sent by another server
    pub async fn store_replica(
        &self,
        request: ReplicateListRequest,
    ) -> anyhow::Result<ShoppingListData> {
        require(&request.list_uuid, "listUuid")?;
        require(&request.list_content, "listContent")?;
        validate_content(&request.list_content)?;

        let row = self
            .persistence
            .list_upsert_replica(
                request.vnode,
                &request.list_uuid,
                request.list_name.as_deref(),
                &request.list_content,
                request.level,
                request.hinted_handoff,
            )
            .await?;
        debug!(
            list = %row.list_uuid,
            vnode = %row.vnode,
            level = row.level,
            hinted = row.hinted_handoff.is_some(),
            "Stored replica"
        );
        Ok(row.to_data())
    }

    pub async fn keys(&self, vnode: VirtualNode, level: i32) -> anyhow::Result<KeysResponse> {
        let lists = self
            .persistence
            .keys_by_level(vnode, level)
            .await?
            .iter()
            .map(ServerListRow::to_data)
            .collect();
        Ok(KeysResponse {
            vnode,
            level,
            lists,
        })
    }

    pub async fn purge(&self) -> anyhow::Result<u64> {
        let purged = self.persistence.purge_marked().await?;
        if purged > 0 {
            info!(purged, "Purged lists marked for deletion");
        }
        Ok(purged)
    }

    // ========================================================================
    // Replication
    // ========================================================================

    /// Copy a primary list to its replicas on the current ring
    pub async fn replicate(&self, list: &ShoppingListData) -> ReplicationOutcome {
        let view = self.view();
        let Some(plan) = ReplicationPlan::for_key(
            &view,
            &list.list_uuid,
            self.settings.replicas,
            self.settings.max_walk,
        ) else {
            debug!(list = %list.list_uuid, "Ring is empty, skipping replication");
            return ReplicationOutcome::default();
        };

        let template = ReplicateListRequest {
            list_uuid: list.list_uuid.clone(),
            list_name: list.list_name.clone(),
            list_content: list.list_content.clone(),
            vnode: plan.primary,
            level: 0,
            hinted_handoff: None,
        };
        let outcome = plan.execute(&view, &self.peers, &template).await;
        debug!(
            list = %list.list_uuid,
            delivered = outcome.delivered.len(),
            hinted = outcome.hinted(),
            missed = outcome.missed.len(),
            "Replicated list"
        );
        outcome
    }

    /// Re-replicate every live primary row. Returns how many rows were sent.
    pub async fn replicate_all(&self) -> anyhow::Result<usize> {
        let rows = self.persistence.keys_all_by_level(0).await?;
        for row in &rows {
            self.replicate(&row.to_data()).await;
        }
        info!(count = rows.len(), "Re-replicated primary lists");
        Ok(rows.len())
    }

    // ========================================================================
    // Ring changes
    // ========================================================================

    /// Install a ring snapshot and move data to match it
    pub async fn install_ring(&self, snapshot: &RingSnapshot) -> anyhow::Result<RebalanceResponse> {
        let installed = self.cluster.write().install(snapshot);
        if !installed {
            return Ok(RebalanceResponse {
                version: self.cluster.read().version(),
                ..Default::default()
            });
        }
        self.rebalance().await
    }

    /// Move every live, unhinted row to where the current ring wants it
    pub async fn rebalance(&self) -> anyhow::Result<RebalanceResponse> {
        let view = self.view();
        let mut result = RebalanceResponse {
            version: view.version(),
            ..Default::default()
        };
        if view.ring().is_empty() {
            return Ok(result);
        }

        let rows = self.persistence.all_live_rows().await?;
        for row in rows.into_iter().filter(|r| r.hinted_handoff.is_none()) {
            let Some(owner) = view.ring().responsible(&row.list_uuid) else {
                continue;
            };

            if row.is_primary() {
                if owner == row.vnode {
                    continue;
                }
                if owner.server_id == self.server_id {
                    self.move_local(&row, owner).await?;
                    result.moved += 1;
                } else if self.push_primary(&view, &row, owner).await {
                    self.persistence.list_mark_row_to_delete(row.id).await?;
                    result.moved += 1;
                } else {
                    self.persistence.list_set_hint(row.id, Some(owner)).await?;
                    result.hinted += 1;
                }
            } else if owner.server_id == self.server_id {
                if owner == row.vnode {
                    self.persistence
                        .update_replication_level(owner, &row.list_uuid, 0)
                        .await?;
                } else {
                    self.move_local(&row, owner).await?;
                }
                result.promoted += 1;
            } else {
                self.persistence.list_mark_row_to_delete(row.id).await?;
                result.marked += 1;
            }
        }

        info!(
            version = result.version,
            moved = result.moved,
            promoted = result.promoted,
            marked = result.marked,
            hinted = result.hinted,
            "Rebalanced after ring change"
        );
        Ok(result)
    }

    /// Merge `row` into a level-0 row at `owner` on this server and retire the old row
    async fn move_local(&self, row: &ServerListRow, owner: VirtualNode) -> anyhow::Result<()> {
        self.persistence
            .list_upsert_replica(
                owner,
                &row.list_uuid,
                row.list_name.as_deref(),
                &row.list_content,
                0,
                None,
            )
            .await
            .with_context(|| format!("moving list {} to {}", row.list_uuid, owner))?;
        self.persistence.list_mark_row_to_delete(row.id).await?;
        Ok(())
    }

    async fn push_primary(&self, view: &ClusterView, row: &ServerListRow, owner: VirtualNode) -> bool {
        let Some(address) = view.address_of_node(owner) else {
            warn!(node = %owner, "No address known for new owner");
            return false;
        };
        let request = ReplicateListRequest {
            list_uuid: row.list_uuid.clone(),
            list_name: row.list_name.clone(),
            list_content: row.list_content.clone(),
            vnode: owner,
            level: 0,
            hinted_handoff: None,
        };
        match self.peers.replicate_list(address, &request).await {
            Ok(_) => true,
            Err(e) => {
                warn!(list = %row.list_uuid, owner = %owner, error = %e, "Could not hand list to new owner");
                false
            }
        }
    }
}
