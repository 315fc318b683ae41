//! Replica placement and delivery
//!
//! A list is copied to the first `replicas` distinct servers after its
//! primary. When one of them is down the copy goes to the next unused
//! candidate, tagged with the node it was meant for (hinted handoff).

use async_trait::async_trait;
use shopring_api::{ReplicateListRequest, VirtualNode};
use shopring_common::ShopringError;
use tracing::{debug, warn};

use crate::cluster::ClusterView;

/// Delivers a replica to a server
#[async_trait]
pub trait ReplicaTransport: Send + Sync {
    async fn replicate(
        &self,
        address: &str,
        request: &ReplicateListRequest,
    ) -> Result<(), ShopringError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplicaTarget {
    pub node: VirtualNode,
    /// 1 for the first replica, 2 for the second, ...
    pub level: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationPlan {
    pub primary: VirtualNode,
    pub intended: Vec<ReplicaTarget>,
    pub fallbacks: Vec<VirtualNode>,
}

/// Where each replica ended up
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplicationOutcome {
    /// `(stored at, intended for, level)`
    pub delivered: Vec<(VirtualNode, VirtualNode, i32)>,
    /// Intended nodes that received no copy at all
    pub missed: Vec<VirtualNode>,
}

impl ReplicationOutcome {
    pub fn hinted(&self) -> usize {
        self.delivered
            .iter()
            .filter(|(stored, intended, _)| stored != intended)
            .count()
    }
}

impl ReplicationPlan {
    pub fn for_key(
        view: &ClusterView,
        key: &str,
        replicas: usize,
        max_walk: usize,
    ) -> Option<Self> {
        let ring = view.ring();
        let primary = ring.responsible(key)?;
        let mut candidates = ring.replica_candidates(key, max_walk.max(replicas));
        let fallbacks = candidates.split_off(replicas.min(candidates.len()));
        let intended = candidates
            .into_iter()
            .zip(1..)
            .map(|(node, level)| ReplicaTarget { node, level })
            .collect();

        Some(Self {
            primary,
            intended,
            fallbacks,
        })
    }

    /// Send `template` to every intended replica, falling back on failures.
    ///
    /// `template` supplies the list fields; `vnode`, `level` and the hint are
    /// filled in per target.
    pub async fn execute(
        &self,
        view: &ClusterView,
        transport: &dyn ReplicaTransport,
        template: &ReplicateListRequest,
    ) -> ReplicationOutcome {
        let mut outcome = ReplicationOutcome::default();
        let mut fallbacks = self.fallbacks.iter().copied();

        for target in &self.intended {
            let mut request = template.clone();
            request.vnode = target.node;
            request.level = target.level;
            request.hinted_handoff = None;

            if deliver(view, transport, target.node, &request).await {
                outcome
                    .delivered
                    .push((target.node, target.node, target.level));
                continue;
            }

            let mut stored = false;
            for fallback in fallbacks.by_ref() {
                request.vnode = fallback;
                request.hinted_handoff = Some(target.node);
                if deliver(view, transport, fallback, &request).await {
                    debug!(
                        list = %request.list_uuid,
                        intended = %target.node,
                        stored = %fallback,
                        "Stored hinted replica"
                    );
                    outcome.delivered.push((fallback, target.node, target.level));
                    stored = true;
                    break;
                }
            }

            if !stored {
                warn!(
                    list = %template.list_uuid,
                    intended = %target.node,
                    "No reachable server for replica"
                );
                outcome.missed.push(target.node);
            }
        }

        outcome
    }
}

async fn deliver(
    view: &ClusterView,
    transport: &dyn ReplicaTransport,
    node: VirtualNode,
    request: &ReplicateListRequest,
) -> bool {
    let Some(address) = view.address_of_node(node) else {
        warn!(node = %node, "No address known for node");
        return false;
    };
    match transport.replicate(address, request).await {
        Ok(()) => true,
        Err(e) => {
            warn!(node = %node, error = %e, "Replica delivery failed");
            false
        }
    }
}
