//! Application state.

use std::sync::Arc;

use classlens_downstream::{ClientConfig, DownstreamClient, ServiceRegistry};

use crate::config::GatewayConfig;

/// Shared application state.
///
/// The downstream client (and the registry inside it) is read-only
/// after startup; no other state is shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub downstream: Arc<DownstreamClient>,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: GatewayConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = ServiceRegistry::from_env()?;
        let downstream = DownstreamClient::new(
            registry,
            ClientConfig {
                timeout: config.request_timeout,
            },
        )?;

        Ok(Self {
            config,
            downstream: Arc::new(downstream),
        })
    }

    /// Create state over an explicit downstream client. Used by tests
    /// to point the gateway at mock services.
    pub fn with_downstream(config: GatewayConfig, downstream: Arc<DownstreamClient>) -> Self {
        Self { config, downstream }
    }
}
