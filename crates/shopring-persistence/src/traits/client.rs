//! Client list persistence trait

use async_trait::async_trait;

use crate::model::ClientList;

#[async_trait]
pub trait ClientListPersistence: Send + Sync {
    async fn list_create(&self, uuid: &str, name: &str, content: &str) -> anyhow::Result<()>;

    async fn list_exists_by_name(&self, name: &str) -> anyhow::Result<bool>;

    async fn list_find_by_name(&self, name: &str) -> anyhow::Result<Option<ClientList>>;

    async fn list_find(&self, uuid: &str) -> anyhow::Result<Option<ClientList>>;

    /// All lists ordered by name
    async fn list_all(&self) -> anyhow::Result<Vec<ClientList>>;

    async fn list_save_content(&self, uuid: &str, content: &str) -> anyhow::Result<bool>;

    /// Create the list or merge `content` into the stored copy.
    ///
    /// A name already used by another list gets ` (<short uuid>)` appended.
    async fn list_upsert(&self, uuid: &str, name: &str, content: &str)
    -> anyhow::Result<ClientList>;

    async fn list_delete(&self, uuid: &str) -> anyhow::Result<bool>;
}
