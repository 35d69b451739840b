//! HTTP transport for the userinfo exchange
//!
//! A thin wrapper over `reqwest::Client` configured for talking to an
//! identity provider:
//! - redirects are not followed (a redirect would carry the bearer token to
//!   another origin)
//! - every request is bounded by a timeout

use std::time::Duration;

use http::{HeaderMap, StatusCode};

use crate::error::{RealmError, RealmResult};
use crate::userinfo::PreparedRequest;

/// Default bound for a single exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pooled HTTP client with a fixed request timeout
#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn new(timeout: Duration) -> RealmResult<Self> {
        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(RealmError::transport)?;

        Ok(Self { inner, timeout })
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a prepared request and read the answer.
    ///
    /// Connection and timeout problems are errors; any HTTP status, including
    /// 4xx/5xx, is a response.
    pub(crate) async fn send(&self, request: PreparedRequest) -> RealmResult<RawResponse> {
        let (method, url, headers, form, timeout) = request.into_parts();

        let mut builder = self
            .inner
            .request(method, url)
            .headers(headers)
            .timeout(timeout.unwrap_or(self.timeout));
        if !form.is_empty() {
            builder = builder.form(&form);
        }

        let response = builder.send().await.map_err(RealmError::transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map(|bytes| bytes.to_vec());

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("inner", &"<reqwest::Client>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Response as read off the wire; the body read may have failed
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Result<Vec<u8>, reqwest::Error>,
}
