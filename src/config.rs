//! Environment-based configuration types for the tenant OAuth server.

use anyhow::Result;

use crate::errors::ConfigError;
use crate::oauth::clients::DEFAULT_CLIENT_LIST_LIMIT;
use crate::tenant::SigningKey;

/// HTTP server port configuration
#[derive(Clone, Debug)]
pub struct HttpPort(u16);

/// One configured tenant
#[derive(Clone, Debug)]
pub struct TenantConfig {
    pub domain: String,
    pub signing_key: SigningKey,
    /// True when no key was configured and one was generated at startup
    pub generated_key: bool,
}

/// Hosted tenants configuration
#[derive(Clone, Debug)]
pub struct Tenants(Vec<TenantConfig>);

/// Whether the dynamic client registration routes are mounted
#[derive(Clone, Debug)]
pub struct EnableClientRegistration(bool);

/// Maximum number of clients returned by a listing
#[derive(Clone, Debug)]
pub struct ClientListLimit(usize);

/// Main application configuration
#[derive(Clone)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub tenants: Tenants,
    pub enable_client_registration: EnableClientRegistration,
    pub client_list_limit: ClientListLimit,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let tenants: Tenants = require_env("TENANTS")?.try_into()?;
        let enable_client_registration: EnableClientRegistration =
            default_env("ENABLE_CLIENT_REGISTRATION", "true").try_into()?;
        let client_list_limit: ClientListLimit = optional_env("CLIENT_LIST_LIMIT").try_into()?;

        Ok(Self {
            version: version()?,
            http_port,
            tenants,
            enable_client_registration,
            client_list_limit,
        })
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarRequired(name.to_string()).into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<String> for Tenants {
    type Error = anyhow::Error;

    /// Parse `domain[=base64-key]` entries separated by `;`
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut tenants: Vec<TenantConfig> = Vec::new();
        for entry in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (domain, key) = match entry.split_once('=') {
                Some((domain, key)) => (domain.trim(), Some(key.trim())),
                None => (entry, None),
            };

            if domain.is_empty() || domain.contains(['/', ' ', ':']) {
                return Err(
                    ConfigError::InvalidTenant(entry.to_string(), "invalid domain".to_string())
                        .into(),
                );
            }
            let domain = domain.to_ascii_lowercase();
            if tenants.iter().any(|t| t.domain == domain) {
                return Err(
                    ConfigError::InvalidTenant(entry.to_string(), "duplicate domain".to_string())
                        .into(),
                );
            }

            let (signing_key, generated_key) = match key {
                None | Some("") => (SigningKey::generate(), true),
                Some(key) => {
                    let signing_key = SigningKey::from_base64(key).map_err(|e| {
                        ConfigError::InvalidTenant(domain.clone(), e.to_string())
                    })?;
                    if signing_key.as_bytes().is_empty() {
                        return Err(ConfigError::InvalidTenant(
                            domain.clone(),
                            "empty signing key".to_string(),
                        )
                        .into());
                    }
                    (signing_key, false)
                }
            };

            tenants.push(TenantConfig {
                domain,
                signing_key,
                generated_key,
            });
        }

        if tenants.is_empty() {
            return Err(ConfigError::EnvVarRequired("TENANTS".to_string()).into());
        }

        Ok(Self(tenants))
    }
}

impl AsRef<Vec<TenantConfig>> for Tenants {
    fn as_ref(&self) -> &Vec<TenantConfig> {
        &self.0
    }
}

impl TryFrom<String> for EnableClientRegistration {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            "false" | "0" | "no" | "off" => Ok(Self(false)),
            _ => Err(ConfigError::BoolParsingFailed(value).into()),
        }
    }
}

impl AsRef<bool> for EnableClientRegistration {
    fn as_ref(&self) -> &bool {
        &self.0
    }
}

impl TryFrom<Option<String>> for ClientListLimit {
    type Error = anyhow::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(Self(DEFAULT_CLIENT_LIST_LIMIT)),
            Some(v) if v.trim().is_empty() => Ok(Self(DEFAULT_CLIENT_LIST_LIMIT)),
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map(Self)
                .map_err(|err| ConfigError::LimitParsingFailed(v, err).into()),
        }
    }
}

impl TryFrom<String> for ClientListLimit {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(Some(value))
    }
}

impl AsRef<usize> for ClientListLimit {
    fn as_ref(&self) -> &usize {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_port() {
        assert_eq!(*HttpPort::try_from(String::new()).unwrap().as_ref(), 8080);
        assert_eq!(*HttpPort::try_from("3000".to_string()).unwrap().as_ref(), 3000);
        assert!(HttpPort::try_from("70000".to_string()).is_err());
    }

    #[test]
    fn test_tenants() {
        let tenants =
            Tenants::try_from("Alice.example.net=c2VjcmV0; bob.example.net;".to_string()).unwrap();
        let tenants = tenants.as_ref();
        assert_eq!(tenants.len(), 2);

        assert_eq!(tenants[0].domain, "alice.example.net");
        assert_eq!(tenants[0].signing_key.as_bytes(), b"secret");
        assert!(!tenants[0].generated_key);

        assert_eq!(tenants[1].domain, "bob.example.net");
        assert!(tenants[1].generated_key);
        assert_eq!(tenants[1].signing_key.as_bytes().len(), 32);
    }

    #[test]
    fn test_invalid_tenants() {
        assert!(Tenants::try_from(String::new()).is_err());
        assert!(Tenants::try_from(" ; ".to_string()).is_err());
        assert!(Tenants::try_from("=c2VjcmV0".to_string()).is_err());
        assert!(Tenants::try_from("alice.example.net=not base64!".to_string()).is_err());
        assert!(Tenants::try_from("https://alice.example.net".to_string()).is_err());

        let err = Tenants::try_from("a.example;A.example".to_string()).unwrap_err();
        assert!(err.to_string().contains("duplicate domain"));
    }

    #[test]
    fn test_enable_client_registration() {
        for value in ["true", "TRUE", "1", "yes", "on"] {
            assert!(*EnableClientRegistration::try_from(value.to_string()).unwrap().as_ref());
        }
        for value in ["false", "0", "No", "off"] {
            assert!(!*EnableClientRegistration::try_from(value.to_string()).unwrap().as_ref());
        }
        let err = EnableClientRegistration::try_from("maybe".to_string()).unwrap_err();
        assert!(err.to_string().starts_with("error-tenant-oauth-config-4"));
    }

    #[test]
    fn test_client_list_limit() {
        assert_eq!(*ClientListLimit::try_from(None).unwrap().as_ref(), 100);
        assert_eq!(*ClientListLimit::try_from("25".to_string()).unwrap().as_ref(), 25);
        assert!(ClientListLimit::try_from("-1".to_string()).is_err());
    }

    #[test]
    fn test_version() {
        assert!(!version().unwrap().is_empty());
    }
}
