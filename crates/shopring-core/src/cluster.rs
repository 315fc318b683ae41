//! Versioned cluster membership
//!
//! Routers own the authoritative view and broadcast it as a [`RingSnapshot`].
//! Servers install snapshots; an older version never replaces a newer one.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use shopring_api::{MemberInfo, RingSnapshot, VirtualNode};
use tracing::{debug, info};

use crate::ring::HashRing;

pub type SharedClusterView = Arc<RwLock<ClusterView>>;

#[derive(Clone, Debug)]
pub struct ClusterView {
    version: u64,
    vnodes_per_server: u32,
    members: BTreeMap<u32, String>,
    ring: HashRing,
}

impl ClusterView {
    pub fn new(vnodes_per_server: u32) -> Self {
        Self {
            version: 0,
            vnodes_per_server,
            members: BTreeMap::new(),
            ring: HashRing::new(vnodes_per_server),
        }
    }

    pub fn from_snapshot(snapshot: &RingSnapshot) -> Self {
        let members: BTreeMap<u32, String> = snapshot
            .members
            .iter()
            .map(|m| (m.id, m.address.clone()))
            .collect();
        let ring = HashRing::with_servers(members.keys().copied(), snapshot.vnodes_per_server);
        Self {
            version: snapshot.version,
            vnodes_per_server: snapshot.vnodes_per_server,
            members,
            ring,
        }
    }

    pub fn shared(self) -> SharedClusterView {
        Arc::new(RwLock::new(self))
    }

    pub fn snapshot(&self) -> RingSnapshot {
        RingSnapshot {
            version: self.version,
            vnodes_per_server: self.vnodes_per_server,
            members: self
                .members
                .iter()
                .map(|(id, address)| MemberInfo {
                    id: *id,
                    address: address.clone(),
                })
                .collect(),
        }
    }

    /// Replace the view with `snapshot` unless it is older than the current one
    pub fn install(&mut self, snapshot: &RingSnapshot) -> bool {
        if snapshot.version < self.version {
            debug!(
                current = self.version,
                offered = snapshot.version,
                "Ignoring stale ring snapshot"
            );
            return false;
        }
        *self = Self::from_snapshot(snapshot);
        info!(
            version = self.version,
            members = self.members.len(),
            "Installed ring snapshot"
        );
        true
    }

    /// Add or re-address a member. Returns true when the ring changed.
    pub fn add_member(&mut self, server_id: u32, address: &str) -> bool {
        self.members.insert(server_id, address.to_string());
        self.ring.add_server(server_id)
    }

    pub fn remove_member(&mut self, server_id: u32) -> Option<String> {
        let address = self.members.remove(&server_id)?;
        self.ring.remove_server(server_id);
        Some(address)
    }

    pub fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn vnodes_per_server(&self) -> u32 {
        self.vnodes_per_server
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    pub fn members(&self) -> &BTreeMap<u32, String> {
        &self.members
    }

    pub fn contains(&self, server_id: u32) -> bool {
        self.members.contains_key(&server_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn address_of(&self, server_id: u32) -> Option<&str> {
        self.members.get(&server_id).map(String::as_str)
    }

    pub fn address_of_node(&self, node: VirtualNode) -> Option<&str> {
        self.address_of(node.server_id)
    }
}
