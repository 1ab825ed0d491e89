//! Application state and request context management.

use std::sync::Arc;

use crate::config::Config;
use crate::oauth::clients::registration::ClientRegistrationService;
use crate::tenant::TenantRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Hosted tenants, resolved per request from the `Host` header
    pub tenants: Arc<TenantRegistry>,
    /// Client registration service for dynamic client registration
    pub client_registration_service: Arc<ClientRegistrationService>,
}

impl AppState {
    pub fn new(config: Config, tenants: TenantRegistry) -> Self {
        let client_registration_service =
            ClientRegistrationService::new(*config.client_list_limit.as_ref());
        Self {
            config: Arc::new(config),
            tenants: Arc::new(tenants),
            client_registration_service: Arc::new(client_registration_service),
        }
    }
}
