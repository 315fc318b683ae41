//! Shared state handed to every request handler

use std::sync::Arc;

use crate::service::StorageService;

pub struct AppState {
    pub storage: Arc<StorageService>,
}

impl AppState {
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self { storage }
    }

    pub fn server_id(&self) -> u32 {
        self.storage.server_id()
    }
}
