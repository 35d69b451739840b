//! Error Types
//!
//! One error enum for the whole realm. Extraction, the userinfo exchange and
//! the realm decision all report through [`RealmError`]; hosts branch on
//! [`RealmError::kind`] and show end clients only [`RealmError::client_message`].

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::userinfo::UserInfoResponseError;

/// Errors produced by credential extraction, the userinfo exchange and the realm
#[derive(Debug, Error)]
pub enum RealmError {
    /// A credential-bearing header was supplied but could not be parsed
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    /// The provider could not be reached or did not answer in time
    #[error("Transport failure: {message}")]
    Transport {
        /// What went wrong on the wire
        message: String,
        /// Underlying HTTP client error, absent for realm-level deadlines
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The provider answered with a non-success status
    #[error("Provider rejected the request: {0}")]
    ProviderRejection(Box<UserInfoResponseError>),

    /// A capability this realm deliberately does not offer
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    /// An endpoint URL that cannot be used for the exchange
    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint {
        /// The offending URL as given
        url: String,
        /// Why it was refused
        reason: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider answered 2xx with a body that is not a userinfo document
    #[error("Failed to parse userinfo response: {0}")]
    ResponseParse(#[source] serde_json::Error),

    /// The realm refused the token before contacting the provider
    #[error("Authentication rejected: {0}")]
    Rejected(String),
}

/// Coarse classification of [`RealmError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealmErrorKind {
    /// See [`RealmError::MalformedCredential`]
    MalformedCredential,
    /// See [`RealmError::Transport`]
    TransportFailure,
    /// See [`RealmError::ProviderRejection`]
    ProviderRejection,
    /// See [`RealmError::UnsupportedOperation`]
    UnsupportedOperation,
    /// See [`RealmError::InvalidEndpoint`]
    InvalidEndpoint,
    /// See [`RealmError::Config`]
    Config,
    /// See [`RealmError::ResponseParse`]
    ResponseParse,
    /// See [`RealmError::Rejected`]
    Rejected,
}

impl RealmErrorKind {
    /// Stable snake_case label, suitable for log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedCredential => "malformed_credential",
            Self::TransportFailure => "transport_failure",
            Self::ProviderRejection => "provider_rejection",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::InvalidEndpoint => "invalid_endpoint",
            Self::Config => "config",
            Self::ResponseParse => "response_parse",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RealmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RealmError {
    /// Wrap an HTTP client failure
    pub fn transport(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request to identity provider timed out".to_string()
        } else if err.is_connect() {
            format!("could not connect to identity provider: {err}")
        } else {
            err.to_string()
        };
        Self::Transport {
            message,
            source: Some(err),
        }
    }

    /// A realm-level deadline expired before the provider answered
    pub fn timeout(deadline: Duration) -> Self {
        Self::Transport {
            message: format!("identity provider did not answer within {deadline:?}"),
            source: None,
        }
    }

    /// Build an [`RealmError::InvalidEndpoint`]
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Classification of this error
    pub fn kind(&self) -> RealmErrorKind {
        match self {
            Self::MalformedCredential(_) => RealmErrorKind::MalformedCredential,
            Self::Transport { .. } => RealmErrorKind::TransportFailure,
            Self::ProviderRejection(_) => RealmErrorKind::ProviderRejection,
            Self::UnsupportedOperation(_) => RealmErrorKind::UnsupportedOperation,
            Self::InvalidEndpoint { .. } => RealmErrorKind::InvalidEndpoint,
            Self::Config(_) => RealmErrorKind::Config,
            Self::ResponseParse(_) => RealmErrorKind::ResponseParse,
            Self::Rejected(_) => RealmErrorKind::Rejected,
        }
    }

    /// Provider rejection details, if this is a [`RealmError::ProviderRejection`]
    pub fn provider_rejection(&self) -> Option<&UserInfoResponseError> {
        match self {
            Self::ProviderRejection(rejection) => Some(rejection),
            _ => None,
        }
    }

    /// Whether the provider was never reached
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Message safe to return to an untrusted client.
    ///
    /// Provider error descriptions stay in logs; clients only learn that
    /// authentication did not succeed.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::UnsupportedOperation(_) => "operation not supported",
            _ => "authentication failed",
        }
    }
}

impl From<UserInfoResponseError> for RealmError {
    fn from(err: UserInfoResponseError) -> Self {
        Self::ProviderRejection(Box::new(err))
    }
}

impl From<config::ConfigError> for RealmError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for realm operations
pub type RealmResult<T> = Result<T, RealmError>;
