//! Consistent-hash ring of virtual nodes
//!
//! Each physical server owns `vnodes_per_server` positions named `S<id>V<i>`.
//! A key belongs to the first position whose token is greater than or equal
//! to the key's token, wrapping around past the last position.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};
use shopring_api::VirtualNode;

/// Ring position of a key: the first 8 bytes of its SHA-256 digest, big-endian
pub fn token(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashRing {
    vnodes_per_server: u32,
    /// Sorted by `(token, node)`
    entries: Vec<(u64, VirtualNode)>,
}

impl HashRing {
    pub fn new(vnodes_per_server: u32) -> Self {
        Self {
            vnodes_per_server,
            entries: Vec::new(),
        }
    }

    pub fn with_servers(server_ids: impl IntoIterator<Item = u32>, vnodes_per_server: u32) -> Self {
        let mut ring = Self::new(vnodes_per_server);
        for id in server_ids {
            ring.insert_server(id);
        }
        ring.entries.sort_unstable();
        ring
    }

    pub fn vnodes_per_server(&self) -> u32 {
        self.vnodes_per_server
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Virtual nodes in ring order
    pub fn nodes(&self) -> impl Iterator<Item = VirtualNode> + '_ {
        self.entries.iter().map(|(_, node)| *node)
    }

    /// Distinct physical servers, ascending
    pub fn servers(&self) -> Vec<u32> {
        self.entries
            .iter()
            .map(|(_, node)| node.server_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn contains_server(&self, server_id: u32) -> bool {
        self.entries
            .iter()
            .any(|(_, node)| node.server_id == server_id)
    }

    /// Returns false when the server is already on the ring
    pub fn add_server(&mut self, server_id: u32) -> bool {
        if self.contains_server(server_id) {
            return false;
        }
        self.insert_server(server_id);
        self.entries.sort_unstable();
        true
    }

    /// Returns false when the server was not on the ring
    pub fn remove_server(&mut self, server_id: u32) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(_, node)| node.server_id != server_id);
        self.entries.len() != before
    }

    fn insert_server(&mut self, server_id: u32) {
        for index in 0..self.vnodes_per_server {
            let node = VirtualNode::new(server_id, index);
            self.entries.push((token(&node.to_string()), node));
        }
    }

    fn position(&self, node: VirtualNode) -> Option<usize> {
        self.entries.iter().position(|(_, n)| *n == node)
    }

    /// Virtual node owning `key`
    pub fn responsible(&self, key: &str) -> Option<VirtualNode> {
        if self.entries.is_empty() {
            return None;
        }
        let t = token(key);
        let idx = self.entries.partition_point(|(tok, _)| *tok < t);
        let idx = if idx == self.entries.len() { 0 } else { idx };
        Some(self.entries[idx].1)
    }

    pub fn next(&self, node: VirtualNode) -> Option<VirtualNode> {
        let pos = self.position(node)?;
        Some(self.entries[(pos + 1) % self.entries.len()].1)
    }

    pub fn previous(&self, node: VirtualNode) -> Option<VirtualNode> {
        let pos = self.position(node)?;
        let len = self.entries.len();
        Some(self.entries[(pos + len - 1) % len].1)
    }

    /// Up to `limit` nodes following `node`, never including `node` itself
    pub fn successors(&self, node: VirtualNode, limit: usize) -> Vec<VirtualNode> {
        let Some(pos) = self.position(node) else {
            return Vec::new();
        };
        let len = self.entries.len();
        (1..len)
            .take(limit)
            .map(|offset| self.entries[(pos + offset) % len].1)
            .collect()
    }

    /// Successor nodes eligible to hold replicas of `key`
    ///
    /// Each physical server appears at most once and the primary's server is
    /// skipped. At most `max_walk` candidates are returned.
    pub fn replica_candidates(&self, key: &str, max_walk: usize) -> Vec<VirtualNode> {
        let Some(primary) = self.responsible(key) else {
            return Vec::new();
        };
        let mut seen = BTreeSet::from([primary.server_id]);
        self.successors(primary, self.entries.len())
            .into_iter()
            .filter(|node| seen.insert(node.server_id))
            .take(max_walk)
            .collect()
    }

    /// Primary followed by the first `replicas` candidates
    pub fn preference_list(&self, key: &str, replicas: usize) -> Vec<VirtualNode> {
        let Some(primary) = self.responsible(key) else {
            return Vec::new();
        };
        let mut list = vec![primary];
        list.extend(self.replica_candidates(key, replicas));
        list
    }
}
