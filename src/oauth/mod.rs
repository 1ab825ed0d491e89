//! OAuth client registry and client token issuance for multi-tenant servers.

pub mod clients;
pub mod jwt;
pub mod permissions;
pub mod secret;
pub mod types;
pub mod validation;

// Re-export frequently used items from each module
pub use clients::ClientRegistrationService;
pub use jwt::Claims;
pub use permissions::{
    ACCESS_TOKEN_AUDIENCE, REFRESH_TOKEN_AUDIENCE, REGISTRATION_TOKEN_AUDIENCE, SCOPE_LOGIN,
    ScopeSet,
};
pub use secret::generate_client_secret;
pub use types::{
    Client, ClientDocument, ClientMetadata, GrantType, NotificationPlatform,
    OAUTH_CLIENTS_DOCTYPE, ResponseType,
};
