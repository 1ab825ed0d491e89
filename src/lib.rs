//! Tenant OAuth library crate.
//!
//! Provides dynamic client registration (RFC 7591) and client token issuance
//! and validation for servers hosting many isolated tenants, each with its own
//! domain, signing key and document store.

pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;
pub mod tenant;
