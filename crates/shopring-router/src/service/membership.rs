//! Ring membership changes and the cluster-wide rebalance that follows them
//!
//! A change runs in three phases, each waiting for every server: install the
//! new ring, purge the rows marked while rebalancing, then re-replicate
//! primaries. Unreachable servers are logged and skipped.

use futures::future::join_all;
use shopring_api::{JoinRequest, RingSnapshot};
use shopring_common::ShopringError;
use tracing::{info, warn};

use super::routing::RouterService;

/// How many servers answered each phase
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    pub installed: usize,
    pub purged: usize,
    pub replicated: usize,
    /// Servers that failed at least one phase
    pub unreachable: Vec<u32>,
}

impl RebalanceReport {
    fn tally(&mut self, phase: &str, results: Vec<(u32, Result<(), ShopringError>)>) -> usize {
        let mut ok = 0;
        for (server_id, result) in results {
            match result {
                Ok(()) => ok += 1,
                Err(e) => {
                    warn!(server_id, phase, error = %e, "Server skipped during rebalance");
                    if !self.unreachable.contains(&server_id) {
                        self.unreachable.push(server_id);
                    }
                }
            }
        }
        ok
    }
}

fn members(snapshot: &RingSnapshot) -> Vec<(u32, String)> {
    snapshot
        .members
        .iter()
        .map(|m| (m.id, m.address.clone()))
        .collect()
}

impl RouterService {
    /// Add a server to the ring and rebalance.
    ///
    /// Joining again with a known id re-broadcasts the ring.
    pub async fn join(&self, request: JoinRequest) -> Result<RingSnapshot, ShopringError> {
        if request.address.trim().is_empty() {
            return Err(ShopringError::IllegalArgument(
                "server address must not be empty".to_string(),
            ));
        }

        let _guard = self.membership.lock().await;
        let snapshot = {
            let mut view = self.cluster().write();
            if !view.add_member(request.server_id, &request.address) {
                info!(server_id = request.server_id, "Server already in ring, re-broadcasting");
            }
            view.bump_version();
            view.snapshot()
        };
        info!(
            server_id = request.server_id,
            address = %request.address,
            version = snapshot.version,
            "Server joined the ring"
        );

        self.rebalance_cluster(&snapshot, None).await;
        self.sync_peers(&snapshot).await;
        Ok(snapshot)
    }

    /// Remove a server from the ring and rebalance
    pub async fn leave(&self, server_id: u32) -> Result<RingSnapshot, ShopringError> {
        let _guard = self.membership.lock().await;
        let (snapshot, address) = {
            let mut view = self.cluster().write();
            let address = view
                .remove_member(server_id)
                .ok_or(ShopringError::ServerNotFound(server_id))?;
            view.bump_version();
            (view.snapshot(), address)
        };
        info!(server_id, version = snapshot.version, "Server left the ring");

        // The leaving server still gets the ring so it can hand over its primaries
        self.rebalance_cluster(&snapshot, Some((server_id, address))).await;
        self.sync_peers(&snapshot).await;
        Ok(snapshot)
    }

    /// Install a snapshot pushed by another router, without orchestrating
    pub fn sync(&self, snapshot: &RingSnapshot) -> RingSnapshot {
        let mut view = self.cluster().write();
        view.install(snapshot);
        view.snapshot()
    }

    /// Send the current ring to every member. Used once at startup.
    pub async fn push_snapshot(&self) -> usize {
        let snapshot = self.snapshot();
        let targets = members(&snapshot);
        let results = join_all(targets.iter().map(|(id, address)| {
            let snapshot = &snapshot;
            async move {
                let result = self.peers().install_ring(address, snapshot).await;
                (*id, result.map(|_| ()))
            }
        }))
        .await;

        let mut report = RebalanceReport::default();
        let installed = report.tally("install", results);
        info!(
            installed,
            members = targets.len(),
            version = snapshot.version,
            "Pushed initial ring"
        );
        installed
    }

    pub async fn rebalance_cluster(
        &self,
        snapshot: &RingSnapshot,
        leaving: Option<(u32, String)>,
    ) -> RebalanceReport {
        let targets = members(snapshot);
        let mut report = RebalanceReport::default();

        let install_targets: Vec<&(u32, String)> = targets.iter().chain(leaving.iter()).collect();
        let results = join_all(install_targets.into_iter().map(|(id, address)| async move {
            let result = self.peers().install_ring(address, snapshot).await;
            (*id, result.map(|_| ()))
        }))
        .await;
        report.installed = report.tally("install", results);

        let results = join_all(targets.iter().map(|(id, address)| async move {
            let result = self.peers().purge_keys(address).await;
            (*id, result.map(|_| ()))
        }))
        .await;
        report.purged = report.tally("purge", results);

        let results = join_all(targets.iter().map(|(id, address)| async move {
            let result = self.peers().replicate_keys(address).await;
            (*id, result.map(|_| ()))
        }))
        .await;
        report.replicated = report.tally("replicate", results);

        info!(
            version = snapshot.version,
            installed = report.installed,
            purged = report.purged,
            replicated = report.replicated,
            unreachable = report.unreachable.len(),
            "Cluster rebalance finished"
        );
        report
    }

    async fn sync_peers(&self, snapshot: &RingSnapshot) {
        let results = join_all(self.peer_routers().iter().map(|address| async move {
            (address, self.peers().sync_ring(address, snapshot).await)
        }))
        .await;
        for (address, result) in results {
            if let Err(e) = result {
                warn!(router = %address, error = %e, "Could not sync ring to peer router");
            }
        }
    }
}
