//! Authentication decision
//!
//! [`Realm`] is the contract a host security layer consults. [`OAuthRealm`]
//! implements it by presenting the caller's secret as a bearer token to the
//! configured userinfo endpoint and turning the answer into a [`User`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::config::RealmConfig;
use crate::error::{RealmError, RealmResult};
use crate::extract::{self, HeaderLookup};
use crate::groups::{ClaimGroups, GroupResolver};
use crate::token::AuthenticationToken;
use crate::transport::HttpTransport;
use crate::user::User;
use crate::userinfo::{BearerToken, RequestInitializer, UserInfoRequest};

/// Realm type reported to hosts
pub const REALM_TYPE: &str = "custom";

/// Result of one authentication decision
pub type AuthenticationOutcome = RealmResult<User>;

/// A pluggable authentication provider
#[async_trait]
pub trait Realm: Send + Sync + std::fmt::Debug {
    /// Realm instance name
    fn name(&self) -> &str;

    /// Realm type
    fn realm_type(&self) -> &'static str {
        REALM_TYPE
    }

    /// Whether this realm can decide on `token`
    fn supports(&self, token: &AuthenticationToken) -> bool;

    /// Derive a token from request headers; `Ok(None)` when none is present
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::MalformedCredential`] for unparseable credentials.
    fn extract_token(&self, headers: &dyn HeaderLookup) -> RealmResult<Option<AuthenticationToken>>;

    /// Decide on a token
    async fn authenticate(&self, token: &AuthenticationToken) -> AuthenticationOutcome;

    /// Look up a user without credentials
    ///
    /// # Errors
    ///
    /// Realms that cannot enumerate users return
    /// [`RealmError::UnsupportedOperation`].
    fn lookup_user(&self, username: &str) -> RealmResult<Option<User>>;

    /// Whether [`Realm::lookup_user`] can succeed
    fn user_lookup_supported(&self) -> bool;

    /// Blocking authentication.
    ///
    /// # Errors
    ///
    /// Always [`RealmError::UnsupportedOperation`].
    #[deprecated(note = "use the asynchronous `Realm::authenticate`")]
    fn authenticate_blocking(&self, token: &AuthenticationToken) -> AuthenticationOutcome {
        error!(
            realm = self.name(),
            token_kind = token.kind(),
            "Blocking authentication is not supported; use the asynchronous form"
        );
        Err(RealmError::UnsupportedOperation(
            "blocking authentication; use the asynchronous form",
        ))
    }
}

/// Realm backed by an OAuth2 userinfo endpoint
#[derive(Clone)]
pub struct OAuthRealm {
    name: String,
    config: Arc<RealmConfig>,
    http: HttpTransport,
    groups: Arc<dyn GroupResolver>,
    request_initializer: Option<Arc<dyn RequestInitializer>>,
}

impl OAuthRealm {
    /// Create a realm from validated configuration.
    ///
    /// Groups are read from the `groups` claim using the configured
    /// delimiters.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Config`] if the configuration is invalid, or
    /// [`RealmError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: impl Into<Arc<RealmConfig>>) -> RealmResult<Self> {
        let config = config.into();
        config.validate()?;
        let http = HttpTransport::new(config.timeout())?;
        let groups = Arc::new(ClaimGroups::new(&config.group_delimiters));

        Ok(Self {
            name: config.name.clone(),
            config,
            http,
            groups,
            request_initializer: None,
        })
    }

    /// Use a different transport
    pub fn with_transport(mut self, http: HttpTransport) -> Self {
        self.http = http;
        self
    }

    /// Use a different group resolver
    pub fn with_group_resolver(mut self, groups: Arc<dyn GroupResolver>) -> Self {
        self.groups = groups;
        self
    }

    /// Shape every userinfo request before the bearer token is attached
    pub fn with_request_initializer(mut self, initializer: Arc<dyn RequestInitializer>) -> Self {
        self.request_initializer = Some(initializer);
        self
    }

    /// Run [`Realm::authenticate`] on the current tokio runtime and deliver
    /// the outcome on a oneshot channel.
    ///
    /// Dropping the receiver cancels the in-flight exchange.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn authenticate_detached(
        self: &Arc<Self>,
        token: AuthenticationToken,
    ) -> oneshot::Receiver<AuthenticationOutcome> {
        let (mut tx, rx) = oneshot::channel();
        let realm = Arc::clone(self);

        tokio::spawn(async move {
            let outcome = tokio::select! {
                outcome = realm.authenticate(&token) => outcome,
                () = tx.closed() => {
                    debug!(realm = %realm.name, "Authentication abandoned by caller");
                    return;
                }
            };
            if tx.send(outcome).is_err() {
                debug!(realm = %realm.name, "Authentication outcome dropped by caller");
            }
        });

        rx
    }

    async fn decide(&self, token: &AuthenticationToken) -> AuthenticationOutcome {
        let AuthenticationToken::UsernamePassword(credentials) = token else {
            return Err(RealmError::Rejected(format!(
                "{} tokens are not supported",
                token.kind()
            )));
        };
        if credentials.has_empty_credential() {
            return Err(RealmError::Rejected("empty credential".to_string()));
        }

        let mut request = UserInfoRequest::from_url(self.config.user_info_url.clone())?
            .with_scopes(&self.config.scopes)
            .with_client_authentication(Arc::new(BearerToken::new(
                credentials.credential().clone(),
            )));
        if let Some(initializer) = &self.request_initializer {
            request = request.with_request_initializer(Arc::clone(initializer));
        }

        let deadline = self.http.timeout();
        let info = match tokio::time::timeout(deadline, request.execute(&self.http)).await {
            Ok(result) => result?,
            Err(_) => return Err(RealmError::timeout(deadline)),
        };

        let groups = self.groups.resolve(credentials.principal(), &info);
        Ok(User::from_userinfo(credentials.principal(), groups, info))
    }
}

impl std::fmt::Debug for OAuthRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthRealm")
            .field("name", &self.name)
            .field("user_info_url", &self.config.user_info_url.as_str())
            .field("http", &self.http)
            .field("groups", &self.groups)
            .field("request_initializer", &self.request_initializer.is_some())
            .finish()
    }
}

#[async_trait]
impl Realm for OAuthRealm {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, token: &AuthenticationToken) -> bool {
        matches!(token, AuthenticationToken::UsernamePassword(_))
    }

    fn extract_token(
        &self,
        headers: &dyn HeaderLookup,
    ) -> RealmResult<Option<AuthenticationToken>> {
        Ok(extract::extract_token(headers)?.map(AuthenticationToken::from))
    }

    async fn authenticate(&self, token: &AuthenticationToken) -> AuthenticationOutcome {
        let started = Instant::now();
        let outcome = self.decide(token).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let principal = token.principal().unwrap_or("-");

        match &outcome {
            Ok(user) => info!(
                realm = %self.name,
                principal,
                groups = user.groups.len(),
                elapsed_ms,
                "Authentication succeeded"
            ),
            Err(e) => warn!(
                realm = %self.name,
                principal,
                kind = %e.kind(),
                elapsed_ms,
                error = %e,
                "Authentication rejected"
            ),
        }

        outcome
    }

    fn lookup_user(&self, username: &str) -> RealmResult<Option<User>> {
        debug!(realm = %self.name, username, "User lookup requested");
        Err(RealmError::UnsupportedOperation("user lookup"))
    }

    fn user_lookup_supported(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::NoGroups;
    use crate::token::UsernamePasswordToken;
    use secrecy::SecretString;

    fn realm() -> OAuthRealm {
        let config = RealmConfig::builder()
            .name("unit")
            .oauth_server("idp.example.com")
            .client_id("client")
            .user_info_url("http://127.0.0.1:1/userinfo")
            .build()
            .unwrap();
        OAuthRealm::new(config).unwrap()
    }

    fn password_token(user: &str, secret: &str) -> AuthenticationToken {
        UsernamePasswordToken::new(user, SecretString::new(secret.to_string()))
            .unwrap()
            .into()
    }

    #[test]
    fn test_realm_identity() {
        let realm = realm();
        assert_eq!(realm.name(), "unit");
        assert_eq!(realm.realm_type(), "custom");
        assert!(!realm.user_lookup_supported());
    }

    #[test]
    fn test_supports_only_username_password() {
        let realm = realm();
        assert!(realm.supports(&password_token("alice", "pw")));
        assert!(!realm.supports(&AuthenticationToken::Bearer {
            token: SecretString::new("t".to_string()),
        }));
        assert!(!realm.supports(&AuthenticationToken::ApiKey {
            key: SecretString::new("k".to_string()),
        }));
    }

    #[test]
    fn test_lookup_user_unsupported() {
        let err = realm().lookup_user("alice").unwrap_err();
        assert!(matches!(err, RealmError::UnsupportedOperation(_)));
    }

    #[test]
    #[allow(deprecated)]
    fn test_blocking_authenticate_unsupported() {
        let err = realm()
            .authenticate_blocking(&password_token("alice", "pw"))
            .unwrap_err();
        assert!(matches!(err, RealmError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RealmConfig::builder()
            .oauth_server("idp.example.com")
            .client_id("client")
            .user_info_url("https://idp.example.com/userinfo")
            .build()
            .unwrap();
        config.timeout_secs = 0;
        assert!(matches!(
            OAuthRealm::new(config).unwrap_err(),
            RealmError::Config(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_secret_rejected_without_exchange() {
        let err = realm()
            .authenticate(&password_token("alice", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, RealmError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unsupported_token_rejected() {
        let token = AuthenticationToken::ApiKey {
            key: SecretString::new("k".to_string()),
        };
        let err = realm().authenticate(&token).await.unwrap_err();
        assert_eq!(err.kind(), crate::RealmErrorKind::Rejected);
    }

    #[test]
    fn test_extract_token_through_realm() {
        let mut headers = std::collections::HashMap::new();
        headers.insert("User".to_string(), "alice".to_string());
        headers.insert("Password".to_string(), "ignored:pw".to_string());
        let token = realm().extract_token(&headers).unwrap().unwrap();
        assert_eq!(token.principal(), Some("alice"));

        let empty: std::collections::HashMap<String, String> = std::collections::HashMap::new();
        assert!(realm().extract_token(&empty).unwrap().is_none());
    }

    #[test]
    fn test_group_resolver_override() {
        let realm = realm().with_group_resolver(Arc::new(NoGroups));
        assert!(format!("{:?}", realm).contains("NoGroups"));
    }
}
