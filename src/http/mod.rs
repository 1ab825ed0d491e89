//! Axum HTTP server handlers for the tenant OAuth endpoints.

pub mod context;
mod handler_oauth_clients;
pub mod middleware_auth;
pub mod server;

pub use context::AppState;
pub use middleware_auth::CurrentTenant;
pub use server::build_router;
