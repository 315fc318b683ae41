//! Shared state handed to every request handler

use std::sync::Arc;

use crate::service::RouterService;

pub struct AppState {
    pub router: Arc<RouterService>,
}

impl AppState {
    pub fn new(router: Arc<RouterService>) -> Self {
        Self { router }
    }
}
