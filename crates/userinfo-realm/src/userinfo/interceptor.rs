//! Request shaping and client authentication
//!
//! A [`UserInfoRequest`](super::UserInfoRequest) is turned into a
//! [`PreparedRequest`] in three passes:
//!
//! 1. the optional [`RequestInitializer`] shapes the fresh request and may
//!    install [`RequestInterceptor`]s,
//! 2. those interceptors run in installation order,
//! 3. the client authentication interceptor runs last.
//!
//! Client authentication always sees the final request, so nothing earlier
//! can strip or overwrite the credential it attaches.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{AUTHORIZATION, HeaderName};
use http::{HeaderMap, HeaderValue, Method};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{RealmError, RealmResult};

/// An outbound request right before it goes on the wire
pub struct PreparedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    form: Vec<(String, String)>,
    timeout: Option<Duration>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl PreparedRequest {
    pub(crate) fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            form: Vec::new(),
            timeout: None,
            interceptors: Vec::new(),
        }
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set (replace) a header
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// URL-encoded form fields, in order
    pub fn form(&self) -> &[(String, String)] {
        &self.form
    }

    /// Append a form field
    pub fn push_form(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.form.push((name.into(), value.into()));
    }

    /// Per-request timeout, overriding the transport default
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Set a per-request timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Install an interceptor to run before client authentication
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub(crate) fn take_interceptors(&mut self) -> Vec<Arc<dyn RequestInterceptor>> {
        std::mem::take(&mut self.interceptors)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Method, Url, HeaderMap, Vec<(String, String)>, Option<Duration>) {
        (self.method, self.url, self.headers, self.form, self.timeout)
    }
}

// Manual Debug impl: header values may carry credentials
impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.keys().map(HeaderName::as_str).collect();
        let form_names: Vec<&str> = self.form.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("PreparedRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &header_names)
            .field("form", &form_names)
            .field("timeout", &self.timeout)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

/// Mutates a request right before it is sent
pub trait RequestInterceptor: Send + Sync {
    /// Apply this interceptor
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be shaped, which aborts the
    /// exchange before anything is sent.
    fn intercept(&self, request: &mut PreparedRequest) -> RealmResult<()>;
}

/// Shapes a freshly created request
pub trait RequestInitializer: Send + Sync {
    /// Initialize the request; may install interceptors
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be shaped.
    fn initialize(&self, request: &mut PreparedRequest) -> RealmResult<()>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut PreparedRequest) -> RealmResult<()> + Send + Sync,
{
    fn intercept(&self, request: &mut PreparedRequest) -> RealmResult<()> {
        self(request)
    }
}

/// `Authorization: Bearer <token>` (RFC 6750 Section 2.1)
#[derive(Clone)]
pub struct BearerToken {
    access_token: SecretString,
}

impl BearerToken {
    /// Create a bearer interceptor for the given access token
    pub fn new(access_token: SecretString) -> Self {
        Self { access_token }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl RequestInterceptor for BearerToken {
    fn intercept(&self, request: &mut PreparedRequest) -> RealmResult<()> {
        let value = sensitive_header(&format!("Bearer {}", self.access_token.expose_secret()))?;
        request.set_header(AUTHORIZATION, value);
        Ok(())
    }
}

/// HTTP Basic client authentication (RFC 6749 Section 2.3.1)
#[derive(Clone)]
pub struct BasicAuthentication {
    username: String,
    password: SecretString,
}

impl BasicAuthentication {
    /// Create a Basic interceptor
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl std::fmt::Debug for BasicAuthentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthentication")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl RequestInterceptor for BasicAuthentication {
    fn intercept(&self, request: &mut PreparedRequest) -> RealmResult<()> {
        let encoded = STANDARD.encode(format!(
            "{}:{}",
            self.username,
            self.password.expose_secret()
        ));
        let value = sensitive_header(&format!("Basic {encoded}"))?;
        request.set_header(AUTHORIZATION, value);
        Ok(())
    }
}

/// Client credentials as form fields (RFC 6749 Section 2.3.1)
#[derive(Clone)]
pub struct ClientParametersAuthentication {
    client_id: String,
    client_secret: Option<SecretString>,
}

impl ClientParametersAuthentication {
    /// Create a form-parameter interceptor; public clients pass no secret
    pub fn new(client_id: impl Into<String>, client_secret: Option<SecretString>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }
}

impl std::fmt::Debug for ClientParametersAuthentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientParametersAuthentication")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl RequestInterceptor for ClientParametersAuthentication {
    fn intercept(&self, request: &mut PreparedRequest) -> RealmResult<()> {
        request.push_form("client_id", self.client_id.clone());
        if let Some(secret) = &self.client_secret {
            request.push_form("client_secret", secret.expose_secret().clone());
        }
        Ok(())
    }
}

fn sensitive_header(value: &str) -> RealmResult<HeaderValue> {
    let mut value = HeaderValue::from_str(value).map_err(|_| {
        RealmError::MalformedCredential(
            "credential contains characters not allowed in an HTTP header".to_string(),
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}
