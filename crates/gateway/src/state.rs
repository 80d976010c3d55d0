//! Application state for dependency injection.

use std::sync::Arc;

use directory_service_lib::DirectoryService;

use crate::config::GatewayConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn DirectoryService>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(directory: Arc<dyn DirectoryService>, config: GatewayConfig) -> Self {
        Self { directory, config }
    }
}
