//! Authentication Tokens
//!
//! Request-scoped credentials handed from extraction to the realm. Secrets
//! live in [`SecretString`]: redacted in `Debug`, zeroized on drop, and never
//! serialized.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{RealmError, RealmResult};

/// Username plus secret, as extracted from request headers
#[derive(Clone)]
pub struct UsernamePasswordToken {
    principal: String,
    credential: SecretString,
}

impl UsernamePasswordToken {
    /// Create a token.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::MalformedCredential`] when `principal` is empty.
    /// An empty credential is accepted here; the realm rejects it when
    /// authenticating.
    pub fn new(principal: impl Into<String>, credential: SecretString) -> RealmResult<Self> {
        let principal = principal.into();
        if principal.is_empty() {
            return Err(RealmError::MalformedCredential(
                "credential has an empty username".to_string(),
            ));
        }
        Ok(Self {
            principal,
            credential,
        })
    }

    /// The asserted username
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// The secret, used as the bearer credential for the userinfo exchange
    pub fn credential(&self) -> &SecretString {
        &self.credential
    }

    /// Whether the secret is zero-length
    pub fn has_empty_credential(&self) -> bool {
        self.credential.expose_secret().is_empty()
    }
}

// Manual Debug impl to keep the credential out of logs
impl std::fmt::Debug for UsernamePasswordToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsernamePasswordToken")
            .field("principal", &self.principal)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

/// Credential shapes a host may offer to a realm
#[derive(Debug, Clone)]
pub enum AuthenticationToken {
    /// Username and secret; the only shape this realm accepts
    UsernamePassword(UsernamePasswordToken),
    /// Bare bearer token
    Bearer {
        /// Token value
        token: SecretString,
    },
    /// API key
    ApiKey {
        /// Key value
        key: SecretString,
    },
}

impl AuthenticationToken {
    /// Asserted username, when the token carries one
    pub fn principal(&self) -> Option<&str> {
        match self {
            Self::UsernamePassword(token) => Some(token.principal()),
            Self::Bearer { .. } | Self::ApiKey { .. } => None,
        }
    }

    /// Short name of the token shape, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UsernamePassword(_) => "username_password",
            Self::Bearer { .. } => "bearer",
            Self::ApiKey { .. } => "api_key",
        }
    }
}

impl From<UsernamePasswordToken> for AuthenticationToken {
    fn from(token: UsernamePasswordToken) -> Self {
        Self::UsernamePassword(token)
    }
}
