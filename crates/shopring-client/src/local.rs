//! The user's local list database

use std::{path::Path, sync::Arc};

use shopring_persistence::{
    ClientDbPersistService, ClientList, ClientListPersistence, connect, init_client_schema,
    sqlite_url,
};
use tracing::info;

/// Lists stored on this device. Every edit lands here first.
#[derive(Clone)]
pub struct LocalStore {
    persistence: Arc<dyn ClientListPersistence>,
}

impl LocalStore {
    pub fn new(persistence: Arc<dyn ClientListPersistence>) -> Self {
        Self { persistence }
    }

    /// Open or create `<data_dir>/<user>_shopping.db`
    pub async fn open(data_dir: &Path, user: &str) -> anyhow::Result<Self> {
        let path = data_dir.join(format!("{}_shopping.db", user));
        let db = connect(&sqlite_url(&path)?).await?;
        init_client_schema(&db).await?;
        info!(user, path = %path.display(), "Opened local database");
        Ok(Self::new(Arc::new(ClientDbPersistService::new(db))))
    }

    pub async fn in_memory() -> anyhow::Result<Self> {
        let db = connect("sqlite::memory:").await?;
        init_client_schema(&db).await?;
        Ok(Self::new(Arc::new(ClientDbPersistService::new(db))))
    }

    pub async fn create(&self, uuid: &str, name: &str, content: &str) -> anyhow::Result<()> {
        self.persistence.list_create(uuid, name, content).await
    }

    pub async fn exists_by_name(&self, name: &str) -> anyhow::Result<bool> {
        self.persistence.list_exists_by_name(name).await
    }

    pub async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<ClientList>> {
        self.persistence.list_find_by_name(name).await
    }

    pub async fn find(&self, uuid: &str) -> anyhow::Result<Option<ClientList>> {
        self.persistence.list_find(uuid).await
    }

    pub async fn all(&self) -> anyhow::Result<Vec<ClientList>> {
        self.persistence.list_all().await
    }

    pub async fn save_content(&self, uuid: &str, content: &str) -> anyhow::Result<bool> {
        self.persistence.list_save_content(uuid, content).await
    }

    pub async fn upsert(&self, uuid: &str, name: &str, content: &str) -> anyhow::Result<ClientList> {
        self.persistence.list_upsert(uuid, name, content).await
    }

    pub async fn delete(&self, uuid: &str) -> anyhow::Result<bool> {
        self.persistence.list_delete(uuid).await
    }
}
