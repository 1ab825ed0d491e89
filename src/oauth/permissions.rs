//! Reserved token audiences and permission scopes.

use std::collections::BTreeSet;

/// Audience of the token authorizing management of a registered client
pub const REGISTRATION_TOKEN_AUDIENCE: &str = "registration";

/// Audience of refresh tokens
pub const REFRESH_TOKEN_AUDIENCE: &str = "refresh";

/// Audience of access tokens
pub const ACCESS_TOKEN_AUDIENCE: &str = "access";

/// Scope used for login/authentication purposes only, granting no data permissions
pub const SCOPE_LOGIN: &str = "login";

/// Set of permission scopes carried in a token's `scope` claim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// Parse a space-separated scope string
    pub fn parse(scope: &str) -> Self {
        Self(scope.split_whitespace().map(|s| s.to_string()).collect())
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the set only grants authentication
    pub fn is_login_only(&self) -> bool {
        self.0.len() == 1 && self.contains(SCOPE_LOGIN)
    }
}

impl std::fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self.0.iter().cloned().collect::<Vec<_>>().join(" ");
        f.write_str(&joined)
    }
}
