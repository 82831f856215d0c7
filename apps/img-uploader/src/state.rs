//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::gateway::DedupGateway;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    gateway: DedupGateway,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, gateway: DedupGateway) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, gateway }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the dedup gateway
    pub fn gateway(&self) -> &DedupGateway {
        &self.inner.gateway
    }
}
