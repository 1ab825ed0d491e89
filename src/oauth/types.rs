//! OAuth client types and data structures.
//!
//! A registered client has two serialized shapes: [`ClientDocument`] is what
//! the document store holds (`_id`/`_rev`), [`Client`] is what the Dynamic
//! Client Registration protocol exchanges (`client_id`). Conversions between
//! them are explicit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::storage::Document;

/// Doctype of persisted OAuth clients
pub const OAUTH_CLIENTS_DOCTYPE: &str = "io.cozy.oauth.clients";

/// OAuth Grant Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

/// OAuth Response Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
}

/// Grant types assigned to every client
pub const GRANT_TYPES: [GrantType; 2] = [GrantType::AuthorizationCode, GrantType::RefreshToken];

/// Response types assigned to every client
pub const RESPONSE_TYPES: [ResponseType; 1] = [ResponseType::Code];

/// Push notification platform of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPlatform {
    /// Firebase Cloud Messaging
    Firebase,
    /// Apple Push Notification service
    Apns,
    /// Legacy alias kept for older mobile clients
    Ios,
    /// Legacy alias kept for older mobile clients
    Android,
}

impl NotificationPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPlatform::Firebase => "firebase",
            NotificationPlatform::Apns => "apns",
            NotificationPlatform::Ios => "ios",
            NotificationPlatform::Android => "android",
        }
    }
}

impl FromStr for NotificationPlatform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "firebase" => Ok(NotificationPlatform::Firebase),
            "apns" => Ok(NotificationPlatform::Apns),
            "ios" => Ok(NotificationPlatform::Ios),
            "android" => Ok(NotificationPlatform::Android),
            _ => Err(format!("unknown notification platform: {}", value)),
        }
    }
}

impl fmt::Display for NotificationPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata declared by the client itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// Mandatory, non-empty
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Mandatory
    #[serde(default)]
    pub client_name: String,
    /// Optional, e.g. "desktop", "mobile", "browser"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub logo_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy_uri: String,
    /// Mandatory, identifies the application across reinstalls
    #[serde(default)]
    pub software_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub software_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notification_platform: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notification_device_token: String,
}

impl ClientMetadata {
    /// Exact-match test against the registered redirect URIs
    pub fn accept_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|registered| registered == uri)
    }
}

/// OAuth client in the Dynamic Client Registration protocol shape (RFC 7591)
///
/// Used both for incoming registration/update requests and for responses.
/// Server-assigned fields sent by a caller are ignored or overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Always 0: secrets never expire
    #[serde(default)]
    pub client_secret_expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_access_token: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_login_scope: bool,
    #[serde(default, skip_deserializing)]
    pub grant_types: Vec<GrantType>,
    #[serde(default, skip_deserializing)]
    pub response_types: Vec<ResponseType>,
    #[serde(flatten)]
    pub metadata: ClientMetadata,
    #[serde(default)]
    pub notifications: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronized_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn accept_redirect_uri(&self, uri: &str) -> bool {
        self.metadata.accept_redirect_uri(uri)
    }
}

/// OAuth client as persisted in the tenant's document store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "String::is_empty")]
    pub rev: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub client_secret_expires_at: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_login_scope: bool,
    #[serde(default)]
    pub grant_types: Vec<GrantType>,
    #[serde(default)]
    pub response_types: Vec<ResponseType>,
    #[serde(flatten)]
    pub metadata: ClientMetadata,
    #[serde(default)]
    pub notifications: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronized_at: Option<DateTime<Utc>>,
}

impl ClientDocument {
    /// Protocol shape: `client_id` takes the storage id, storage fields are dropped
    pub fn into_client(self) -> Client {
        Client {
            client_id: self.id,
            client_secret: Some(self.client_secret).filter(|s| !s.is_empty()),
            client_secret_expires_at: self.client_secret_expires_at,
            registration_access_token: None,
            allow_login_scope: self.allow_login_scope,
            grant_types: self.grant_types,
            response_types: self.response_types,
            metadata: self.metadata,
            notifications: self.notifications,
            synchronized_at: self.synchronized_at,
        }
    }

    /// Copy with the secret cleared, for listings
    pub fn without_secret(mut self) -> Self {
        self.client_secret.clear();
        self
    }

    pub fn accept_redirect_uri(&self, uri: &str) -> bool {
        self.metadata.accept_redirect_uri(uri)
    }
}

impl Document for ClientDocument {
    fn doctype() -> &'static str {
        OAUTH_CLIENTS_DOCTYPE
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn rev(&self) -> &str {
        &self.rev
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn set_rev(&mut self, rev: String) {
        self.rev = rev;
    }
}
