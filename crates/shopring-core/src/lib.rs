//! Shopring Core - Cluster placement and peer communication
//!
//! This crate provides:
//! - Consistent-hash ring over virtual nodes (`ring`)
//! - Versioned cluster membership (`cluster`)
//! - Replica placement and delivery with hinted handoff (`replication`)
//! - Typed HTTP client for storage servers (`peer`)
//! - Failover HTTP client for routers (`http`)

pub mod cluster;
pub mod http;
pub mod peer;
pub mod replication;
pub mod ring;

pub use cluster::{ClusterView, SharedClusterView};
pub use http::{FailoverHttpClient, HttpClientConfig};
pub use peer::PeerClient;
pub use replication::{ReplicaTarget, ReplicaTransport, ReplicationOutcome, ReplicationPlan};
pub use ring::{HashRing, token};
