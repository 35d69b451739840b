//! CLI error types

use thiserror::Error;
use userinfo_realm::{RealmError, RealmErrorKind};

/// Errors surfaced by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The supplied headers carry no credential
    #[error("No credentials found in the supplied headers")]
    NoCredentials,

    /// The realm refused the credential
    #[error("Authentication rejected ({kind}): {source}")]
    Rejected {
        /// Classification of the rejection
        kind: RealmErrorKind,
        /// Full realm error
        #[source]
        source: RealmError,
    },

    /// Realm setup or extraction failed
    #[error(transparent)]
    Realm(#[from] RealmError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Hints for resolving the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::NoCredentials => vec![
                "Pass -H 'Authorization: Basic <base64 user:secret>'",
                "Or pass both -H 'User: <name>' and -H 'Password: <secret>'",
            ],
            Self::Rejected { kind, .. } if *kind == RealmErrorKind::TransportFailure => vec![
                "Check that the userinfo endpoint is reachable",
                "Increase the deadline with --timeout",
            ],
            Self::Realm(RealmError::Config(_)) => vec![
                "Set OAUTH_SERVER, REALM_CLIENT_ID and USER_INFO_URL",
                "Or pass --config <file>",
            ],
            _ => vec![],
        }
    }
}

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;
