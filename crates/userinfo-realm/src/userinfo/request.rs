//! Userinfo request (token exchange client)

use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::exception::UserInfoResponseError;
use super::interceptor::{PreparedRequest, RequestInitializer, RequestInterceptor};
use super::response::UserInfoResponse;
use crate::error::{RealmError, RealmResult};
use crate::transport::HttpTransport;

/// A single POST to a userinfo endpoint.
///
/// Built per exchange attempt and consumed by [`UserInfoRequest::execute`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use secrecy::SecretString;
/// use userinfo_realm::{BearerToken, HttpTransport, UserInfoRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new(Duration::from_secs(10))?;
/// let info = UserInfoRequest::new("https://idp.example.com/oauth2/userinfo")?
///     .with_scopes(["openid", "profile"])
///     .with_client_authentication(Arc::new(BearerToken::new(SecretString::new(
///         "access-token".to_string(),
///     ))))
///     .execute(&transport)
///     .await?;
/// println!("subject: {:?}", info.sub);
/// # Ok(())
/// # }
/// ```
pub struct UserInfoRequest {
    server_url: Url,
    scopes: Option<String>,
    fields: Vec<(String, String)>,
    request_initializer: Option<Arc<dyn RequestInitializer>>,
    client_authentication: Option<Arc<dyn RequestInterceptor>>,
}

impl UserInfoRequest {
    /// Create a request for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::InvalidEndpoint`] if the URL does not parse or
    /// carries a fragment.
    pub fn new(server_url: &str) -> RealmResult<Self> {
        let url = Url::parse(server_url)
            .map_err(|e| RealmError::invalid_endpoint(server_url, e.to_string()))?;
        Self::from_url(url)
    }

    /// Create a request for an already parsed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::InvalidEndpoint`] if the URL carries a fragment.
    pub fn from_url(server_url: Url) -> RealmResult<Self> {
        if server_url.fragment().is_some() {
            return Err(RealmError::invalid_endpoint(
                server_url.as_str(),
                "endpoint URL must not contain a fragment",
            ));
        }
        Ok(Self {
            server_url,
            scopes: None,
            fields: Vec::new(),
            request_initializer: None,
            client_authentication: None,
        })
    }

    /// Endpoint URL
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Space-separated scope list, if any
    pub fn scopes(&self) -> Option<&str> {
        self.scopes.as_deref()
    }

    /// Request scopes; joined with a single space. An empty list clears them.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = scopes
            .into_iter()
            .map(|scope| scope.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.scopes = (!joined.is_empty()).then_some(joined);
        self
    }

    /// Add an extra form field to the request body
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Set the base request initializer
    pub fn with_request_initializer(mut self, initializer: Arc<dyn RequestInitializer>) -> Self {
        self.request_initializer = Some(initializer);
        self
    }

    /// Set the client authentication.
    ///
    /// It runs after the initializer and every interceptor the initializer
    /// installs.
    pub fn with_client_authentication(
        mut self,
        authentication: Arc<dyn RequestInterceptor>,
    ) -> Self {
        self.client_authentication = Some(authentication);
        self
    }

    /// Build the outbound request without sending it.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by the initializer or an interceptor.
    pub fn prepare(&self) -> RealmResult<PreparedRequest> {
        let mut request = PreparedRequest::new(Method::POST, self.server_url.clone());

        if let Some(scopes) = &self.scopes {
            request.push_form("scope", scopes.clone());
        }
        for (name, value) in &self.fields {
            request.push_form(name.clone(), value.clone());
        }

        if let Some(initializer) = &self.request_initializer {
            initializer.initialize(&mut request)?;
        }
        for interceptor in request.take_interceptors() {
            interceptor.intercept(&mut request)?;
        }
        if let Some(authentication) = &self.client_authentication {
            authentication.intercept(&mut request)?;
        }

        Ok(request)
    }

    /// Send the request and return the raw successful response.
    ///
    /// # Errors
    ///
    /// - [`RealmError::Transport`] if the provider cannot be reached or the
    ///   success body cannot be read
    /// - [`RealmError::ProviderRejection`] for any non-2xx status
    #[tracing::instrument(skip_all, fields(endpoint = %self.server_url))]
    pub async fn execute_unparsed(
        self,
        transport: &HttpTransport,
    ) -> RealmResult<UnparsedResponse> {
        let request = self.prepare()?;
        let response = transport.send(request).await?;

        if response.status.is_success() {
            let body = response.body.map_err(RealmError::transport)?;
            debug!(status = response.status.as_u16(), "Userinfo request succeeded");
            return Ok(UnparsedResponse {
                status: response.status,
                headers: response.headers,
                body,
            });
        }

        warn!(
            status = response.status.as_u16(),
            reason = response.status.canonical_reason().unwrap_or(""),
            "Identity provider rejected userinfo request"
        );
        let body = match response.body {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(error = %e, "Could not read error body from identity provider");
                None
            }
        };
        Err(
            UserInfoResponseError::from_parts(response.status, response.headers, body.as_deref())
                .into(),
        )
    }

    /// Send the request and parse the userinfo document.
    ///
    /// # Errors
    ///
    /// Everything [`UserInfoRequest::execute_unparsed`] returns, plus
    /// [`RealmError::ResponseParse`] if a 2xx body is not a userinfo document.
    pub async fn execute(self, transport: &HttpTransport) -> RealmResult<UserInfoResponse> {
        self.execute_unparsed(transport).await?.parse()
    }
}

impl std::fmt::Debug for UserInfoRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserInfoRequest")
            .field("server_url", &self.server_url.as_str())
            .field("scopes", &self.scopes)
            .field("fields", &self.fields.len())
            .field("request_initializer", &self.request_initializer.is_some())
            .field("client_authentication", &self.client_authentication.is_some())
            .finish()
    }
}

/// A successful response whose body has not been interpreted yet
#[derive(Debug, Clone)]
pub struct UnparsedResponse {
    /// HTTP status (always 2xx)
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
}

impl UnparsedResponse {
    /// Parse the body as a userinfo document
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::ResponseParse`] if the body is not valid JSON of
    /// the expected shape.
    pub fn parse(&self) -> RealmResult<UserInfoResponse> {
        serde_json::from_slice(&self.body).map_err(RealmError::ResponseParse)
    }
}
