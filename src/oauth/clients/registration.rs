//! OAuth 2.0 Dynamic Client Registration implementation (RFC 7591).
//!
//! Handles client registration requests, validation, name de-duplication,
//! secret rotation and the lookups the rest of the server needs.

use chrono::Utc;
use url::Url;

use crate::errors::{ClientRegistrationError, StorageError};
use crate::oauth::permissions::REGISTRATION_TOKEN_AUDIENCE;
use crate::oauth::secret::generate_client_secret;
use crate::oauth::types::*;
use crate::storage::documents;
use crate::storage::traits::{FindRequest, Selector};
use crate::tenant::Tenant;

/// Default maximum number of clients returned by [`ClientRegistrationService::get_all`]
pub const DEFAULT_CLIENT_LIST_LIMIT: usize = 100;

/// Client Registration Service
///
/// Stateless apart from configuration: every call receives the tenant whose
/// store, domain and key it operates on.
#[derive(Debug, Clone)]
pub struct ClientRegistrationService {
    /// Maximum number of clients returned by a listing
    list_limit: usize,
}

impl Default for ClientRegistrationService {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_LIST_LIMIT)
    }
}

impl ClientRegistrationService {
    pub fn new(list_limit: usize) -> Self {
        Self { list_limit }
    }

    /// Register a new OAuth client
    ///
    /// The returned client carries its secret and a registration access token
    /// that authorizes later reads, updates and deletion.
    pub async fn register(
        &self,
        tenant: &Tenant,
        candidate: Client,
    ) -> Result<Client, ClientRegistrationError> {
        let mut metadata = candidate.metadata;
        validate_metadata(tenant, &mut metadata)?;

        metadata.client_name = self.unique_client_name(tenant, &metadata.client_name).await?;

        let mut doc = ClientDocument {
            id: String::new(),
            rev: String::new(),
            client_secret: generate_client_secret(),
            client_secret_expires_at: 0,
            allow_login_scope: false,
            grant_types: GRANT_TYPES.to_vec(),
            response_types: RESPONSE_TYPES.to_vec(),
            metadata,
            notifications: candidate.notifications,
            synchronized_at: None,
        };

        documents::create_doc(tenant.store(), &mut doc)
            .await
            .map_err(|e| {
                tracing::error!(
                    domain = %tenant.domain(),
                    nspace = "oauth",
                    error = ?e,
                    "Failed to persist the client"
                );
                ClientRegistrationError::InternalServerError
            })?;

        let registration_token = doc
            .create_jwt(tenant, REGISTRATION_TOKEN_AUDIENCE, "")
            .map_err(|_| ClientRegistrationError::InternalServerError)?;

        tracing::info!(
            domain = %tenant.domain(),
            nspace = "oauth",
            client_id = %doc.id,
            client_name = %doc.metadata.client_name,
            "Registered OAuth client"
        );

        let mut client = doc.into_client();
        client.registration_access_token = Some(registration_token);
        Ok(client)
    }

    /// Update the metadata of a registered client
    ///
    /// `previous` is the stored version the candidate replaces. The client
    /// name, identifiers and server-controlled fields are kept from it.
    pub async fn update(
        &self,
        tenant: &Tenant,
        candidate: Client,
        previous: &ClientDocument,
    ) -> Result<Client, ClientRegistrationError> {
        if candidate.client_id != previous.id {
            return Err(ClientRegistrationError::InvalidClientId(
                "client_id is mandatory".to_string(),
            ));
        }

        let mut metadata = candidate.metadata;
        validate_metadata(tenant, &mut metadata)?;

        let client_secret = match candidate.client_secret.as_deref() {
            None | Some("") => previous.client_secret.clone(),
            Some(secret) if secret == previous.client_secret => generate_client_secret(),
            Some(_) => {
                return Err(ClientRegistrationError::InvalidClientSecret(
                    "client_secret is invalid".to_string(),
                ));
            }
        };

        metadata.client_name = previous.metadata.client_name.clone();
        if metadata.notification_platform.is_empty() {
            metadata.notification_platform = previous.metadata.notification_platform.clone();
        }
        if metadata.notification_device_token.is_empty() {
            metadata.notification_device_token =
                previous.metadata.notification_device_token.clone();
        }

        let mut doc = ClientDocument {
            id: previous.id.clone(),
            rev: previous.rev.clone(),
            client_secret,
            client_secret_expires_at: 0,
            allow_login_scope: previous.allow_login_scope,
            grant_types: GRANT_TYPES.to_vec(),
            response_types: RESPONSE_TYPES.to_vec(),
            metadata,
            notifications: previous.notifications.clone(),
            synchronized_at: previous.synchronized_at,
        };

        documents::update_doc(tenant.store(), &mut doc)
            .await
            .map_err(|e| storage_failure(tenant, "update", e))?;

        Ok(doc.into_client())
    }

    /// Unregister a client
    pub async fn delete(
        &self,
        tenant: &Tenant,
        client: &ClientDocument,
    ) -> Result<(), ClientRegistrationError> {
        documents::delete_doc(tenant.store(), client)
            .await
            .map_err(|e| storage_failure(tenant, "delete", e))?;

        tracing::info!(
            domain = %tenant.domain(),
            nspace = "oauth",
            client_id = %client.id,
            "Deleted OAuth client"
        );
        Ok(())
    }

    /// Record that the client has synchronized with the tenant
    pub async fn mark_synchronized(
        &self,
        tenant: &Tenant,
        client: &mut ClientDocument,
    ) -> Result<(), StorageError> {
        let mut synchronized = client.clone();
        synchronized.synchronized_at = Some(Utc::now());
        documents::update_doc(tenant.store(), &mut synchronized).await?;
        *client = synchronized;
        Ok(())
    }

    /// Load the tenant's clients, without their secrets
    pub async fn get_all(&self, tenant: &Tenant) -> Result<Vec<ClientDocument>, StorageError> {
        let clients =
            match documents::all_docs::<ClientDocument>(tenant.store(), Some(self.list_limit))
                .await
            {
                Ok(clients) => clients,
                Err(StorageError::NoDatabase(_)) => Vec::new(),
                Err(e) => return Err(e),
            };
        Ok(clients
            .into_iter()
            .map(ClientDocument::without_secret)
            .collect())
    }

    /// Load the clients that declared a notification platform
    pub async fn get_notifiables(
        &self,
        tenant: &Tenant,
    ) -> Result<Vec<ClientDocument>, StorageError> {
        let request = FindRequest::new(Selector::exists("notification_platform"))
            .use_index("by-notification-platform");
        match documents::find_docs(tenant.store(), &request).await {
            Err(StorageError::NoDatabase(_)) => Ok(Vec::new()),
            result => result,
        }
    }

    /// Load a client by its storage identifier
    pub async fn find_client(
        &self,
        tenant: &Tenant,
        client_id: &str,
    ) -> Result<ClientDocument, StorageError> {
        let found = match documents::get_doc::<ClientDocument>(tenant.store(), client_id).await {
            Ok(found) => found,
            Err(StorageError::NoDatabase(_)) => None,
            Err(e) => {
                tracing::error!(
                    domain = %tenant.domain(),
                    nspace = "oauth",
                    error = ?e,
                    "Failed to find the client {}",
                    client_id
                );
                return Err(e);
            }
        };

        found.ok_or_else(|| {
            tracing::error!(
                domain = %tenant.domain(),
                nspace = "oauth",
                "Failed to find the client {}: not found",
                client_id
            );
            StorageError::NotFound(client_id.to_string())
        })
    }

    /// Load the client registered for a software identifier, if any
    ///
    /// Only expected to be called while bootstrapping a tenant, so the query
    /// does not rely on an index.
    pub async fn find_client_by_software_id(
        &self,
        tenant: &Tenant,
        software_id: &str,
    ) -> Result<Option<ClientDocument>, StorageError> {
        let request = FindRequest::new(Selector::equal("software_id", software_id)).limit(1);
        match documents::find_docs::<ClientDocument>(tenant.store(), &request).await {
            Ok(results) => Ok(results.into_iter().next()),
            Err(StorageError::NoDatabase(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Pick a display name that does not collide with an existing client
    ///
    /// When the name is taken, the result is `name-N` with N one above the
    /// largest numeric suffix already in use (at least 2).
    async fn unique_client_name(
        &self,
        tenant: &Tenant,
        name: &str,
    ) -> Result<String, ClientRegistrationError> {
        let request =
            FindRequest::new(Selector::starts_with("client_name", name)).use_index("by-client-name");
        let existing = match documents::find_docs::<ClientDocument>(tenant.store(), &request).await
        {
            Ok(existing) => existing,
            Err(StorageError::NoDatabase(_)) => Vec::new(),
            Err(e) => {
                tracing::error!(
                    domain = %tenant.domain(),
                    nspace = "oauth",
                    error = ?e,
                    "Failed to look up clients by name"
                );
                return Err(ClientRegistrationError::InternalServerError);
            }
        };

        let prefix = format!("{}-", name);
        let mut next_suffix: u64 = 2;
        let mut taken = false;
        for other in &existing {
            let other_name = other.metadata.client_name.as_str();
            if other_name == name {
                taken = true;
                continue;
            }
            // Suffixes that cannot be incremented are ignored
            if let Some(n) = other_name
                .strip_prefix(&prefix)
                .and_then(|suffix| suffix.parse::<u64>().ok())
                .and_then(|n| n.checked_add(1))
            {
                next_suffix = next_suffix.max(n);
            }
        }

        if taken {
            Ok(format!("{}-{}", name, next_suffix))
        } else {
            Ok(name.to_string())
        }
    }
}

fn storage_failure(tenant: &Tenant, action: &str, error: StorageError) -> ClientRegistrationError {
    tracing::error!(
        domain = %tenant.domain(),
        nspace = "oauth",
        error = ?error,
        "Failed to {} the client",
        action
    );
    ClientRegistrationError::from(error)
}

/// Check the fields every registration and update must carry
///
/// Also normalizes the notification platform to lowercase.
fn validate_metadata(
    tenant: &Tenant,
    metadata: &mut ClientMetadata,
) -> Result<(), ClientRegistrationError> {
    if metadata.redirect_uris.is_empty() {
        return Err(ClientRegistrationError::InvalidRedirectUri(
            "redirect_uris is mandatory".to_string(),
        ));
    }
    for uri in &metadata.redirect_uris {
        validate_redirect_uri(tenant, uri)?;
    }

    if metadata.client_name.is_empty() {
        return Err(ClientRegistrationError::InvalidClientMetadata(
            "client_name is mandatory".to_string(),
        ));
    }
    if metadata.software_id.is_empty() {
        return Err(ClientRegistrationError::InvalidClientMetadata(
            "software_id is mandatory".to_string(),
        ));
    }

    if !metadata.notification_platform.is_empty() {
        let platform = metadata
            .notification_platform
            .parse::<NotificationPlatform>()
            .map_err(|_| ClientRegistrationError::InvalidClientMetadata(String::new()))?;
        metadata.notification_platform = platform.to_string();
    }

    Ok(())
}

/// A redirect URI must be absolute, must not point back at the tenant and
/// must not carry a fragment
fn validate_redirect_uri(tenant: &Tenant, uri: &str) -> Result<(), ClientRegistrationError> {
    let invalid = || ClientRegistrationError::InvalidRedirectUri(format!("{} is invalid", uri));

    let parsed = Url::parse(uri).map_err(|_| invalid())?;

    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    if host.eq_ignore_ascii_case(tenant.domain()) {
        return Err(invalid());
    }

    if parsed.fragment().is_some_and(|f| !f.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}
