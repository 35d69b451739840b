//! Typed failure for a non-success userinfo response
//!
//! Built from the status, headers and (if it could be read) the body of the
//! provider's answer. JSON bodies are parsed into [`UserInfoErrorResponse`];
//! anything else is kept as raw text. Parsing problems never hide the
//! original status.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use thiserror::Error;
use tracing::warn;

use super::error_response::{ErrorCode, UserInfoErrorResponse};

const JSON_MEDIA_TYPE: &str = "application/json";

/// A provider rejection with whatever detail could be recovered
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UserInfoResponseError {
    status: StatusCode,
    status_message: Option<String>,
    headers: HeaderMap,
    details: Option<UserInfoErrorResponse>,
    content: Option<String>,
    message: String,
}

impl UserInfoResponseError {
    /// Classify a provider response.
    ///
    /// `body` is `None` when the body could not be read at all.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Option<&[u8]>) -> Self {
        let status_message = status.canonical_reason().map(str::to_string);

        let mut details = None;
        let detail_string = match body {
            Some(bytes) if !status.is_success() && declares_json(&headers) => {
                match serde_json::from_slice::<UserInfoErrorResponse>(bytes) {
                    Ok(parsed) => {
                        let rendered = parsed.to_pretty_string();
                        details = Some(parsed);
                        Some(rendered)
                    }
                    Err(e) => {
                        warn!(
                            status = status.as_u16(),
                            error = %e,
                            "Could not parse JSON error body from identity provider"
                        );
                        None
                    }
                }
            }
            Some(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            None => None,
        };

        let mut message = match &status_message {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        let content = detail_string.filter(|detail| !detail.is_empty());
        if let Some(detail) = &content {
            message.push('\n');
            message.push_str(detail);
        }

        Self {
            status,
            status_message,
            headers,
            details,
            content,
            message,
        }
    }

    /// HTTP status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// HTTP status code as a number
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Reason phrase for the status
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Structured error document, when the body was JSON and parsed
    pub fn details(&self) -> Option<&UserInfoErrorResponse> {
        self.details.as_ref()
    }

    /// Detail text: pretty JSON for structured errors, otherwise the raw body
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Full message: status line plus detail text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shortcut for the structured error code
    pub fn error_code(&self) -> Option<&ErrorCode> {
        self.details.as_ref().map(|details| &details.error)
    }
}

fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers_with_content_type(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_json_error_parsed() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::BAD_REQUEST,
            headers_with_content_type("application/json"),
            Some(br#"{"error":"invalid_grant"}"#.as_slice()),
        );
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.status_message(), Some("Bad Request"));
        assert_eq!(err.error_code(), Some(&ErrorCode::InvalidGrant));
        assert!(err.content().unwrap().contains("invalid_grant"));
        assert!(err.message().starts_with("400 Bad Request\n"));
    }

    #[test]
    fn test_json_with_charset_parameter() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::UNAUTHORIZED,
            headers_with_content_type("Application/JSON; charset=utf-8"),
            Some(br#"{"error":"invalid_token","error_description":"expired"}"#.as_slice()),
        );
        let details = err.details().unwrap();
        assert_eq!(details.error, ErrorCode::InvalidToken);
        assert_eq!(details.error_description.as_deref(), Some("expired"));
    }

    #[test]
    fn test_non_json_keeps_raw_body() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::BAD_REQUEST,
            headers_with_content_type("text/plain"),
            Some(b"{\"error\":\"invalid_grant\"}".as_slice()),
        );
        assert!(err.details().is_none());
        assert_eq!(err.content(), Some("{\"error\":\"invalid_grant\"}"));
    }

    #[test]
    fn test_missing_content_type_keeps_raw_body() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::FORBIDDEN,
            HeaderMap::new(),
            Some(b"go away".as_slice()),
        );
        assert!(err.details().is_none());
        assert_eq!(err.content(), Some("go away"));
        assert_eq!(err.to_string(), "403 Forbidden\ngo away");
    }

    #[test]
    fn test_non_utf8_body_kept_lossily() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::FORBIDDEN,
            headers_with_content_type("text/plain; charset=latin1"),
            Some(b"acc\xe8s refus\xe9".as_slice()),
        );
        assert_eq!(err.content(), Some("acc\u{FFFD}s refus\u{FFFD}"));
        assert_eq!(err.message(), "403 Forbidden\nacc\u{FFFD}s refus\u{FFFD}");
    }

    #[test]
    fn test_invalid_json_degrades_to_status_line() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::INTERNAL_SERVER_ERROR,
            headers_with_content_type("application/json"),
            Some(b"<html>oops</html>".as_slice()),
        );
        assert!(err.details().is_none());
        assert!(err.content().is_none());
        assert_eq!(err.message(), "500 Internal Server Error");
    }

    #[test]
    fn test_unreadable_body_keeps_status() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::BAD_GATEWAY,
            headers_with_content_type("application/json"),
            None,
        );
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), "502 Bad Gateway");
    }

    #[test]
    fn test_empty_body_has_no_content() {
        let err = UserInfoResponseError::from_parts(
            StatusCode::UNAUTHORIZED,
            HeaderMap::new(),
            Some(b"".as_slice()),
        );
        assert!(err.content().is_none());
        assert_eq!(err.message(), "401 Unauthorized");
    }

    #[test]
    fn test_headers_preserved() {
        let mut headers = headers_with_content_type("text/plain");
        headers.insert(
            "www-authenticate",
            HeaderValue::from_static("Bearer error=\"invalid_token\""),
        );
        let err = UserInfoResponseError::from_parts(
            StatusCode::UNAUTHORIZED,
            headers,
            Some(b"".as_slice()),
        );
        assert!(err.headers().contains_key("www-authenticate"));
    }
}
