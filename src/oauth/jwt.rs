//! Signed token codec.
//!
//! Tokens are compact HS256 JWTs keyed by the tenant's [`SigningKey`]. A token
//! signed for one tenant never verifies under another tenant's key.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::TokenError;
use crate::oauth::permissions::ScopeSet;
use crate::tenant::SigningKey;

/// Token claims
///
/// `exp` is optional: registration and refresh tokens are issued without it
/// and never expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Purpose of the token (see [`crate::oauth::permissions`])
    pub aud: String,
    /// Tenant domain
    pub iss: String,
    /// Client storage identifier
    pub sub: String,
    /// Issued at, seconds since epoch
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Claims {
    /// Claims issued now, without expiry or scope
    pub fn new(audience: &str, issuer: &str, subject: &str) -> Self {
        Self {
            aud: audience.to_string(),
            iss: issuer.to_string(),
            sub: subject.to_string(),
            iat: Utc::now().timestamp(),
            exp: None,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_expiry(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// True when the claims carry an expiry that has passed
    pub fn expired(&self) -> bool {
        self.exp.is_some_and(|exp| exp <= Utc::now().timestamp())
    }

    pub fn scopes(&self) -> ScopeSet {
        ScopeSet::parse(self.scope.as_deref().unwrap_or_default())
    }
}

/// Sign claims with the tenant key
pub fn sign(key: &SigningKey, claims: &Claims) -> Result<String, TokenError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|e| TokenError::SigningFailed(e.to_string()))
}

/// Verify a token's signature with the tenant key and decode its claims
///
/// Fails on a bad signature, a malformed token, or an embedded expiry that
/// has passed. Audience, issuer and subject are left to the caller.
pub fn parse(key: &SigningKey, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_aud = false;
    validation.validate_exp = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::permissions::{REFRESH_TOKEN_AUDIENCE, REGISTRATION_TOKEN_AUDIENCE};

    #[test]
    fn test_sign_and_parse() {
        let key = SigningKey::generate();
        let claims = Claims::new(REGISTRATION_TOKEN_AUDIENCE, "alice.example.net", "client-1");

        let token = sign(&key, &claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let parsed = parse(&key, &token).unwrap();
        assert_eq!(parsed, claims);
        assert!(parsed.exp.is_none());
        assert!(!parsed.expired());
    }

    #[test]
    fn test_scope_is_carried() {
        let key = SigningKey::generate();
        let claims = Claims::new(REFRESH_TOKEN_AUDIENCE, "alice.example.net", "client-1")
            .with_scope("io.cozy.files login");

        let parsed = parse(&key, &sign(&key, &claims).unwrap()).unwrap();
        assert_eq!(parsed.scope.as_deref(), Some("io.cozy.files login"));
        assert!(parsed.scopes().contains("login"));

        let empty = Claims::new(REFRESH_TOKEN_AUDIENCE, "a", "b").with_scope("");
        assert!(empty.scope.is_none());
    }

    #[test]
    fn test_wrong_key_is_a_signature_error() {
        let key_a = SigningKey::generate();
        let key_b = SigningKey::generate();
        let token = sign(&key_a, &Claims::new("registration", "a.example", "c")).unwrap();

        assert!(matches!(parse(&key_b, &token), Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let key = SigningKey::generate();
        let past = Utc::now().timestamp() - 60;
        let claims = Claims::new("access", "a.example", "c").with_expiry(past);
        assert!(claims.expired());

        let token = sign(&key, &claims).unwrap();
        assert!(matches!(parse(&key, &token), Err(TokenError::Expired)));

        let future = Utc::now().timestamp() + 3600;
        let claims = Claims::new("access", "a.example", "c").with_expiry(future);
        let token = sign(&key, &claims).unwrap();
        assert_eq!(parse(&key, &token).unwrap().exp, Some(future));
    }

    #[test]
    fn test_malformed_token() {
        let key = SigningKey::generate();
        assert!(matches!(parse(&key, "not-a-jwt"), Err(TokenError::Malformed(_))));
        assert!(parse(&key, "").is_err());
    }
}
