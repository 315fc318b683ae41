//! List and product operations for one signed-in user
//!
//! Every change is saved locally first and then pushed to the cluster. Being
//! offline is never an error; the next sync catches up.

use shopring_common::{ShopringError, error};
use shopring_consistency::PnCounterMap;
use shopring_persistence::ClientList;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{local::LocalStore, remote::RouterClient};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    Offline,
}

/// Errors meaning the cluster cannot be reached right now
fn is_offline(err: &ShopringError) -> bool {
    match err {
        ShopringError::NodeUnavailable(..) | ShopringError::NetworkError(_) => true,
        ShopringError::ApiError(code, _) => {
            *code == error::NODE_DOWN_FAILURE.code || *code == error::RING_EMPTY.code
        }
        _ => false,
    }
}

fn product_name(name: &str) -> Result<&str, ShopringError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ShopringError::IllegalArgument(
            "product name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

fn positive(quantity: u64) -> Result<u64, ShopringError> {
    if quantity == 0 {
        return Err(ShopringError::IllegalArgument(
            "quantity must be a positive number".to_string(),
        ));
    }
    Ok(quantity)
}

pub struct ShoppingSession {
    user: String,
    store: LocalStore,
    router: RouterClient,
}

impl ShoppingSession {
    pub fn new(user: &str, store: LocalStore, router: RouterClient) -> Self {
        Self {
            user: user.to_string(),
            store,
            router,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    async fn load(&self, uuid: &str) -> anyhow::Result<(ClientList, PnCounterMap)> {
        let list = self
            .store
            .find(uuid)
            .await?
            .ok_or_else(|| ShopringError::ListNotFound(uuid.to_string()))?;
        let content = PnCounterMap::from_json(&list.content)?;
        Ok((list, content))
    }

    async fn save_and_sync(
        &self,
        uuid: &str,
        content: &PnCounterMap,
    ) -> anyhow::Result<SyncStatus> {
        self.store.save_content(uuid, &content.to_json()?).await?;
        self.sync(uuid).await
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// Create an empty list and return its uuid
    pub async fn create_list(&self, name: &str) -> anyhow::Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(
                ShopringError::IllegalArgument("list name must not be empty".to_string()).into(),
            );
        }
        if self.store.exists_by_name(name).await? {
            return Err(ShopringError::ListAlreadyExists(name.to_string()).into());
        }

        let uuid = Uuid::new_v4().to_string();
        self.store
            .create(&uuid, name, &PnCounterMap::new().to_json()?)
            .await?;
        info!(list = %uuid, name, "Created list");

        if let Err(e) = self.sync(&uuid).await {
            warn!(list = %uuid, error = %e, "New list not pushed");
        }
        Ok(uuid)
    }

    /// `(uuid, name)` of every local list, ordered by name
    pub async fn lists(&self) -> anyhow::Result<Vec<(String, String)>> {
        Ok(self
            .store
            .all()
            .await?
            .into_iter()
            .map(|l| (l.uuid, l.name))
            .collect())
    }

    pub async fn find_list(&self, name: &str) -> anyhow::Result<Option<String>> {
        Ok(self.store.find_by_name(name.trim()).await?.map(|l| l.uuid))
    }

    pub async fn list_name(&self, uuid: &str) -> anyhow::Result<Option<String>> {
        Ok(self.store.find(uuid).await?.map(|l| l.name))
    }

    /// Remove the list from this device only
    pub async fn delete_list(&self, uuid: &str) -> anyhow::Result<()> {
        if !self.store.delete(uuid).await? {
            return Err(ShopringError::ListNotFound(uuid.to_string()).into());
        }
        info!(list = uuid, "Deleted local list");
        Ok(())
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// Visible products and their quantities
    pub async fn products(&self, uuid: &str) -> anyhow::Result<Vec<(String, i64)>> {
        let (_, content) = self.load(uuid).await?;
        Ok(content.items())
    }

    pub async fn add_product(
        &self,
        uuid: &str,
        name: &str,
        quantity: u64,
    ) -> anyhow::Result<SyncStatus> {
        let name = product_name(name)?;
        let quantity = positive(quantity)?;
        let (_, mut content) = self.load(uuid).await?;
        if content.is_visible(name) {
            return Err(ShopringError::ProductAlreadyExists(name.to_string()).into());
        }

        content.increment(name, &self.user, quantity);
        debug!(list = uuid, product = name, quantity, "Added product");
        self.save_and_sync(uuid, &content).await
    }

    pub async fn remove_product(&self, uuid: &str, name: &str) -> anyhow::Result<SyncStatus> {
        let name = product_name(name)?;
        let (_, mut content) = self.load(uuid).await?;
        if !content.is_visible(name) {
            return Err(ShopringError::ProductNotFound(name.to_string()).into());
        }

        content.remove(name, &self.user);
        debug!(list = uuid, product = name, "Removed product");
        self.save_and_sync(uuid, &content).await
    }

    pub async fn update_product(
        &self,
        uuid: &str,
        name: &str,
        quantity: u64,
    ) -> anyhow::Result<SyncStatus> {
        let name = product_name(name)?;
        let quantity = positive(quantity)?;
        let (_, mut content) = self.load(uuid).await?;
        if !content.is_visible(name) {
            return Err(ShopringError::ProductNotFound(name.to_string()).into());
        }

        content.set(name, &self.user, quantity);
        debug!(list = uuid, product = name, quantity, "Updated product");
        self.save_and_sync(uuid, &content).await
    }

    // ========================================================================
    // Cluster
    // ========================================================================

    /// Push the local state and merge back whatever the cluster holds
    pub async fn sync(&self, uuid: &str) -> anyhow::Result<SyncStatus> {
        let (list, _) = self.load(uuid).await?;
        match self.router.update_list(uuid, &list.name, &list.content).await {
            Ok(response) => {
                let merged = PnCounterMap::merge_json(&list.content, &response.list.list_content)?;
                self.store.save_content(uuid, &merged).await?;
                debug!(list = uuid, message = %response.message, "Synced list");
                Ok(SyncStatus::Synced)
            }
            Err(e) if is_offline(&e) => {
                debug!(list = uuid, error = %e, "Cluster unreachable, keeping local changes");
                Ok(SyncStatus::Offline)
            }
            Err(e) => {
                warn!(list = uuid, error = %e, "Sync rejected");
                Err(e.into())
            }
        }
    }

    /// Fetch a list shared by someone else and merge it into the local store
    pub async fn download(&self, uuid: &str) -> anyhow::Result<ClientList> {
        let uuid = uuid.trim();
        if uuid.is_empty() {
            return Err(
                ShopringError::IllegalArgument("list id must not be empty".to_string()).into(),
            );
        }

        let remote = self.router.get_list(uuid).await?;
        let name = remote
            .list_name
            .clone()
            .unwrap_or_else(|| "shared list".to_string());
        let list = self.store.upsert(uuid, &name, &remote.list_content).await?;
        info!(list = uuid, name = %list.name, "Downloaded list");
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_errors() {
        assert!(is_offline(&ShopringError::NodeUnavailable(
            "http://127.0.0.1:6001".to_string(),
            "refused".to_string()
        )));
        assert!(is_offline(&ShopringError::ApiError(
            error::NODE_DOWN_FAILURE.code,
            "down".to_string()
        )));
        assert!(!is_offline(&ShopringError::ApiError(
            error::PARAMETER_VALIDATE_ERROR.code,
            "bad".to_string()
        )));
    }

    #[test]
    fn test_input_checks() {
        assert_eq!(product_name("  milk ").unwrap(), "milk");
        assert!(product_name("   ").is_err());
        assert!(positive(0).is_err());
        assert_eq!(positive(3).unwrap(), 3);
    }
}
