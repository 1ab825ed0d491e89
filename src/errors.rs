//! Standardized error types following the `error-tenant-oauth-<domain>-<number>` format.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-tenant-oauth-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when PORT cannot be parsed
    #[error("error-tenant-oauth-config-2 Parsing PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-tenant-oauth-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when boolean string cannot be parsed
    #[error(
        "error-tenant-oauth-config-4 Failed to parse boolean '{0}': expected true/false/1/0/yes/no/on/off"
    )]
    BoolParsingFailed(String),

    /// Error when a tenant entry cannot be parsed
    #[error("error-tenant-oauth-config-5 Invalid tenant entry '{0}': {1}")]
    InvalidTenant(String, String),

    /// Error when a numeric limit cannot be parsed
    #[error("error-tenant-oauth-config-6 Failed to parse limit '{0}': {1}")]
    LimitParsingFailed(String, std::num::ParseIntError),
}

/// Document store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when query execution fails
    #[error("error-tenant-oauth-storage-1 Query execution failed: {0}")]
    QueryFailed(String),

    /// Error when data serialization fails
    #[error("error-tenant-oauth-storage-2 Data serialization failed: {0}")]
    SerializationFailed(String),

    /// Error when data validation fails
    #[error("error-tenant-oauth-storage-3 Invalid data: {0}")]
    InvalidData(String),

    /// Error when requested document is not found
    #[error("error-tenant-oauth-storage-4 Not found: {0}")]
    NotFound(String),

    /// Error when the revision of a written document is stale
    #[error("error-tenant-oauth-storage-5 Document update conflict: {0}")]
    Conflict(String),

    /// Error when the doctype has never been written
    #[error("error-tenant-oauth-storage-6 No database for doctype: {0}")]
    NoDatabase(String),
}

/// Token signing and parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match the tenant key
    #[error("error-tenant-oauth-token-1 Invalid token signature")]
    InvalidSignature,

    /// Embedded expiry has passed
    #[error("error-tenant-oauth-token-2 Token expired")]
    Expired,

    /// Token cannot be decoded
    #[error("error-tenant-oauth-token-3 Malformed token: {0}")]
    Malformed(String),

    /// Claims cannot be signed
    #[error("error-tenant-oauth-token-4 Failed to sign token: {0}")]
    SigningFailed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Client registration errors (RFC 7591 section 3.2.2)
///
/// Each variant maps to a status code and a machine-readable `error` tag that
/// HTTP handlers serialize as `{"error": ..., "error_description": ...}`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientRegistrationError {
    /// Missing or unacceptable redirect URI
    #[error("error-tenant-oauth-client-1 Invalid redirect URI: {0}")]
    InvalidRedirectUri(String),

    /// Missing or unacceptable client metadata
    #[error("error-tenant-oauth-client-2 Invalid client metadata: {0}")]
    InvalidClientMetadata(String),

    /// Client identifier does not match the registered client
    #[error("error-tenant-oauth-client-3 Invalid client id: {0}")]
    InvalidClientId(String),

    /// Supplied secret is neither empty nor the current secret
    #[error("error-tenant-oauth-client-4 Invalid client secret: {0}")]
    InvalidClientSecret(String),

    /// Stored client changed since it was read
    #[error("error-tenant-oauth-client-5 Client was modified concurrently")]
    Conflict,

    /// Storage or signing failure
    #[error("error-tenant-oauth-client-6 Internal server error")]
    InternalServerError,
}

impl ClientRegistrationError {
    /// HTTP status for the error response
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClientRegistrationError::InvalidRedirectUri(_)
            | ClientRegistrationError::InvalidClientMetadata(_)
            | ClientRegistrationError::InvalidClientId(_)
            | ClientRegistrationError::InvalidClientSecret(_) => StatusCode::BAD_REQUEST,
            ClientRegistrationError::Conflict => StatusCode::CONFLICT,
            ClientRegistrationError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable `error` tag
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientRegistrationError::InvalidRedirectUri(_) => "invalid_redirect_uri",
            ClientRegistrationError::InvalidClientMetadata(_) => "invalid_client_metadata",
            ClientRegistrationError::InvalidClientId(_) => "invalid_client_id",
            ClientRegistrationError::InvalidClientSecret(_) => "invalid_client_secret",
            ClientRegistrationError::Conflict => "conflict",
            ClientRegistrationError::InternalServerError => "internal_server_error",
        }
    }

    /// Human-readable `error_description`, never set for internal errors
    pub fn description(&self) -> Option<&str> {
        match self {
            ClientRegistrationError::InvalidRedirectUri(d)
            | ClientRegistrationError::InvalidClientMetadata(d)
            | ClientRegistrationError::InvalidClientId(d)
            | ClientRegistrationError::InvalidClientSecret(d) => {
                Some(d.as_str()).filter(|d| !d.is_empty())
            }
            ClientRegistrationError::Conflict | ClientRegistrationError::InternalServerError => {
                None
            }
        }
    }
}

impl From<StorageError> for ClientRegistrationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(_) => ClientRegistrationError::Conflict,
            _ => ClientRegistrationError::InternalServerError,
        }
    }
}

impl IntoResponse for ClientRegistrationError {
    fn into_response(self) -> Response {
        let body = match self.description() {
            Some(description) => json!({
                "error": self.error_code(),
                "error_description": description,
            }),
            None => json!({ "error": self.error_code() }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
