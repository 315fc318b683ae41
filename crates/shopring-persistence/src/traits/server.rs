//! Server list persistence trait
//!
//! Rows marked `to_delete` are invisible to every lookup until purged.
//! Lookups by `(uuid, vnode)` only see unhinted rows unless a hint is given:
//! copies parked for another node live in rows of their own.

use async_trait::async_trait;
use shopring_api::VirtualNode;

use crate::model::ServerListRow;

#[async_trait]
pub trait ServerListPersistence: Send + Sync {
    async fn list_exists(&self, list_uuid: &str, vnode: VirtualNode) -> anyhow::Result<bool>;

    async fn list_find(
        &self,
        list_uuid: &str,
        vnode: VirtualNode,
    ) -> anyhow::Result<Option<ServerListRow>>;

    /// Any live copy of the list, primary rows first
    async fn list_find_any(&self, list_uuid: &str) -> anyhow::Result<Option<ServerListRow>>;

    /// Store a new primary (level 0) row
    async fn list_create(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        list_name: Option<&str>,
        list_content: &str,
    ) -> anyhow::Result<ServerListRow>;

    /// Merge `list_content` into the stored row. Returns `None` if there is no row.
    async fn list_merge_content(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        list_content: &str,
    ) -> anyhow::Result<Option<ServerListRow>>;

    /// Insert a copy, or merge into the live row with the same hint and take the new level
    async fn list_upsert_replica(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        list_name: Option<&str>,
        list_content: &str,
        level: i32,
        hinted_handoff: Option<VirtualNode>,
    ) -> anyhow::Result<ServerListRow>;

    /// Unhinted rows stored for `vnode` at `level`
    async fn keys_by_level(&self, vnode: VirtualNode, level: i32)
    -> anyhow::Result<Vec<ServerListRow>>;

    async fn keys_all_by_level(&self, level: i32) -> anyhow::Result<Vec<ServerListRow>>;

    async fn list_mark_to_delete(&self, vnode: VirtualNode, list_uuid: &str) -> anyhow::Result<u64>;

    async fn list_mark_row_to_delete(&self, row_id: i32) -> anyhow::Result<bool>;

    /// Delete marked rows, returning how many were removed
    async fn purge_marked(&self) -> anyhow::Result<u64>;

    async fn update_replication_level(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        level: i32,
    ) -> anyhow::Result<bool>;

    async fn list_set_hint(
        &self,
        row_id: i32,
        hinted_handoff: Option<VirtualNode>,
    ) -> anyhow::Result<bool>;

    /// Live rows waiting for delivery to another node
    async fn hinted_rows(&self) -> anyhow::Result<Vec<ServerListRow>>;

    async fn all_live_rows(&self) -> anyhow::Result<Vec<ServerListRow>>;
}
