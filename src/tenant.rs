//! Tenant ("instance") context.
//!
//! Every registry and token operation receives the tenant explicitly: its
//! domain is the token issuer, its key signs the tokens, and its store holds
//! the clients. Nothing here is process-global.

use base64::prelude::*;
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::storage::traits::DocumentStore;

/// Length of generated signing keys in bytes
pub const SIGNING_KEY_LEN: usize = 32;

/// Symmetric key used to sign a tenant's tokens
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; SIGNING_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Decode a standard base64 key
    pub fn from_base64(value: &str) -> Result<Self, base64::DecodeError> {
        BASE64_STANDARD.decode(value.trim()).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// An isolated account boundary: domain, signing key and document store
#[derive(Clone)]
pub struct Tenant {
    domain: String,
    signing_key: SigningKey,
    store: Arc<dyn DocumentStore>,
}

impl Tenant {
    pub fn new(
        domain: impl Into<String>,
        signing_key: SigningKey,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            domain: domain.into(),
            signing_key,
            store,
        }
    }

    /// Domain name, used as token issuer
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

impl fmt::Debug for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tenant")
            .field("domain", &self.domain)
            .field("signing_key", &self.signing_key)
            .finish_non_exhaustive()
    }
}

/// Lookup of tenants by domain
#[derive(Clone, Default)]
pub struct TenantRegistry {
    tenants: HashMap<String, Arc<Tenant>>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tenant: Tenant) {
        self.tenants
            .insert(tenant.domain().to_ascii_lowercase(), Arc::new(tenant));
    }

    pub fn get(&self, domain: &str) -> Option<Arc<Tenant>> {
        self.tenants.get(&domain.to_ascii_lowercase()).cloned()
    }

    /// Resolve the tenant addressed by an HTTP `Host` header value
    pub fn resolve_host(&self, host: &str) -> Option<Arc<Tenant>> {
        let domain = match host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => host,
        };
        self.get(domain)
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
