//! Client token issuance and validation.
//!
//! Validation is a boolean trust decision: the caller only learns whether the
//! token is acceptable. The reason for a rejection is logged for the tenant
//! and never returned.

use crate::errors::TokenError;
use crate::oauth::jwt::{self, Claims};
use crate::oauth::types::ClientDocument;
use crate::tenant::Tenant;

impl ClientDocument {
    /// Sign a token for this client with the given audience and optional scope
    pub fn create_jwt(
        &self,
        tenant: &Tenant,
        audience: &str,
        scope: &str,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(audience, tenant.domain(), &self.id).with_scope(scope);
        jwt::sign(tenant.signing_key(), &claims).inspect_err(|err| {
            tracing::error!(
                domain = %tenant.domain(),
                nspace = "oauth",
                error = ?err,
                "Failed to create the {} token",
                audience
            );
        })
    }

    /// Check a token presented on behalf of this client
    ///
    /// Returns the claims when the token verifies under the tenant key, has
    /// not expired, and names the expected audience, the tenant as issuer and
    /// this client as subject. Registration and refresh tokens carry no
    /// expiry, so their issue date is not checked.
    pub fn valid_token(&self, tenant: &Tenant, audience: &str, token: &str) -> Option<Claims> {
        let domain = tenant.domain();
        if token.is_empty() {
            tracing::error!(domain = %domain, nspace = "oauth", "Empty {} token", audience);
            return None;
        }

        let claims = match jwt::parse(tenant.signing_key(), token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::error!(
                    domain = %domain,
                    nspace = "oauth",
                    error = ?err,
                    "Failed to verify the {} token",
                    audience
                );
                return None;
            }
        };

        if claims.expired() {
            tracing::error!(
                domain = %domain,
                nspace = "oauth",
                "Failed to verify the {} token: expired",
                audience
            );
            return None;
        }

        if claims.aud != audience {
            tracing::error!(
                domain = %domain,
                nspace = "oauth",
                "Unexpected audience for {} token: {}",
                audience,
                claims.aud
            );
            return None;
        }

        if claims.iss != domain {
            tracing::error!(
                domain = %domain,
                nspace = "oauth",
                "Expected {} issuer for {} token, but was: {}",
                domain,
                audience,
                claims.iss
            );
            return None;
        }

        if claims.sub != self.id {
            tracing::error!(
                domain = %domain,
                nspace = "oauth",
                "Expected {} subject for {} token, but was: {}",
                self.id,
                audience,
                claims.sub
            );
            return None;
        }

        Some(claims)
    }
}
