//! Credential Extraction
//!
//! Derives a [`UsernamePasswordToken`] from inbound request headers. Two
//! shapes are understood, checked in order:
//!
//! 1. `Authorization: <scheme> <base64(username:secret)>`
//! 2. `User: <username>` together with `Password: [<ignored>:]<secret>`
//!
//! A request carrying neither yields `Ok(None)`. A request carrying a
//! credential header that cannot be parsed yields
//! [`RealmError::MalformedCredential`], before any network activity.

use std::collections::HashMap;
use std::hash::BuildHasher;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use tracing::debug;

use crate::error::{RealmError, RealmResult};
use crate::token::UsernamePasswordToken;

/// Standard authorization header
pub const AUTH_HEADER: &str = "Authorization";
/// Proxy-injected username header
pub const USER_HEADER: &str = "User";
/// Proxy-injected password header
pub const PASSWORD_HEADER: &str = "Password";

/// Read access to a request's headers.
///
/// Lookups try the exact name first and then fall back to an ASCII
/// case-insensitive match.
pub trait HeaderLookup {
    /// Value of the named header, if present and valid UTF-8
    fn get_header(&self, name: &str) -> Option<&str>;

    /// Whether the named header is present, textual or not
    fn contains_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// All headers with textual values
    fn header_entries(&self) -> Vec<(&str, &str)>;
}

impl<S: BuildHasher> HeaderLookup for HashMap<String, String, S> {
    fn get_header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.get(name) {
            return Some(value.as_str());
        }
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn header_entries(&self) -> Vec<(&str, &str)> {
        self.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

impl HeaderLookup for http::HeaderMap {
    fn get_header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }

    fn contains_header(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn header_entries(&self) -> Vec<(&str, &str)> {
        self.iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v)))
            .collect()
    }
}

/// Extract a username/password token from request headers.
///
/// # Errors
///
/// Returns [`RealmError::MalformedCredential`] when:
/// - `Authorization` is present without a space between scheme and payload
/// - the payload is not base64, not UTF-8, or not exactly `username:secret`
///   with both parts non-empty
/// - only one of `User` / `Password` is present, or `User` is empty
/// - a credential header is present but its value is not visible ASCII text
pub fn extract_token<H>(headers: &H) -> RealmResult<Option<UsernamePasswordToken>>
where
    H: HeaderLookup + ?Sized,
{
    log_headers(headers);

    match text_header(headers, AUTH_HEADER)? {
        Some(value) => parse_authorization(value).map(Some),
        None => username_password_token(headers),
    }
}

fn text_header<'a, H>(headers: &'a H, name: &str) -> RealmResult<Option<&'a str>>
where
    H: HeaderLookup + ?Sized,
{
    match headers.get_header(name) {
        Some(value) => Ok(Some(value)),
        None if headers.contains_header(name) => Err(RealmError::MalformedCredential(format!(
            "{name} header value is not valid text"
        ))),
        None => Ok(None),
    }
}

fn parse_authorization(value: &str) -> RealmResult<UsernamePasswordToken> {
    let value = value.trim();
    let Some(idx) = value.rfind(' ') else {
        return Err(RealmError::MalformedCredential(
            "Authorization header has no scheme/payload separator".to_string(),
        ));
    };

    let payload = &value[idx + 1..];
    let decoded = STANDARD.decode(payload).map_err(|e| {
        RealmError::MalformedCredential(format!("Authorization payload is not base64: {e}"))
    })?;
    let decoded = String::from_utf8(decoded).map_err(|_| {
        RealmError::MalformedCredential("Authorization payload is not UTF-8".to_string())
    })?;

    let mut parts = decoded.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(user), Some(secret), None) if !user.is_empty() && !secret.is_empty() => {
            UsernamePasswordToken::new(user, SecretString::new(secret.to_string()))
        }
        _ => Err(RealmError::MalformedCredential(
            "Authorization payload is not of the form username:secret".to_string(),
        )),
    }
}

fn username_password_token<H>(headers: &H) -> RealmResult<Option<UsernamePasswordToken>>
where
    H: HeaderLookup + ?Sized,
{
    match (
        text_header(headers, USER_HEADER)?,
        text_header(headers, PASSWORD_HEADER)?,
    ) {
        (None, None) => Ok(None),
        (Some(user), Some(password)) => {
            let secret = secret_from_password(password);
            UsernamePasswordToken::new(user, SecretString::new(secret.to_string())).map(Some)
        }
        (Some(_), None) => Err(RealmError::MalformedCredential(
            "User header supplied without Password header".to_string(),
        )),
        (None, Some(_)) => Err(RealmError::MalformedCredential(
            "Password header supplied without User header".to_string(),
        )),
    }
}

/// Secret part of a `Password` header value: everything after the first
/// colon, or the whole value when there is none.
pub fn secret_from_password(password: &str) -> &str {
    match password.split_once(':') {
        Some((_, secret)) => secret,
        None => password,
    }
}

fn log_headers<H>(headers: &H)
where
    H: HeaderLookup + ?Sized,
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    for (name, value) in headers.header_entries() {
        let shown = if is_sensitive(name) { "[REDACTED]" } else { value };
        debug!(header = name, value = shown, "Inspecting request header");
    }
}

fn is_sensitive(name: &str) -> bool {
    name.eq_ignore_ascii_case(AUTH_HEADER) || name.eq_ignore_ascii_case(PASSWORD_HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn basic(user_secret: &str) -> String {
        format!("Basic {}", STANDARD.encode(user_secret))
    }

    #[test]
    fn test_no_credential_headers() {
        let map = headers(&[("Content-Type", "application/json"), ("X-Trace", "1")]);
        assert!(extract_token(&map).unwrap().is_none());

        let empty: HashMap<String, String> = HashMap::new();
        assert!(extract_token(&empty).unwrap().is_none());
    }

    #[test]
    fn test_authorization_round_trip() {
        for (user, secret) in [("alice", "s3cret"), ("svc-account", "a.b.c"), ("ü", "π")] {
            let map = headers(&[("Authorization", &basic(&format!("{user}:{secret}")))]);
            let token = extract_token(&map).unwrap().unwrap();
            assert_eq!(token.principal(), user);
            assert_eq!(token.credential().expose_secret(), secret);
        }
    }

    #[test]
    fn test_authorization_uses_segment_after_last_space() {
        let value = format!("Custom Basic {}", STANDARD.encode("carol:pw"));
        let map = headers(&[("Authorization", &value)]);
        let token = extract_token(&map).unwrap().unwrap();
        assert_eq!(token.principal(), "carol");
        assert_eq!(token.credential().expose_secret(), "pw");
    }

    #[test]
    fn test_authorization_without_space_is_malformed() {
        for value in ["", "Basic", STANDARD.encode("dave:pw").as_str()] {
            let map = headers(&[("Authorization", value)]);
            let err = extract_token(&map).unwrap_err();
            assert!(matches!(err, RealmError::MalformedCredential(_)), "{value}");
        }
    }

    #[test]
    fn test_authorization_bad_payload_is_malformed() {
        let cases = [
            "Basic !!!not-base64!!!".to_string(),
            basic("no-colon-here"),
            basic(":missing-user"),
            basic("missing-secret:"),
            basic("too:many:parts"),
        ];
        for value in cases {
            let map = headers(&[("Authorization", &value)]);
            let err = extract_token(&map).unwrap_err();
            assert!(matches!(err, RealmError::MalformedCredential(_)), "{value}");
        }
    }

    #[test]
    fn test_authorization_takes_priority_over_user_password() {
        let map = headers(&[
            ("Authorization", &basic("erin:from-auth")),
            ("User", "frank"),
            ("Password", "from-headers"),
        ]);
        let token = extract_token(&map).unwrap().unwrap();
        assert_eq!(token.principal(), "erin");
        assert_eq!(token.credential().expose_secret(), "from-auth");
    }

    #[test]
    fn test_password_without_colon_is_whole_secret() {
        let map = headers(&[("User", "gina"), ("Password", "plain-secret")]);
        let token = extract_token(&map).unwrap().unwrap();
        assert_eq!(token.principal(), "gina");
        assert_eq!(token.credential().expose_secret(), "plain-secret");
    }

    #[test]
    fn test_password_secret_after_first_colon() {
        let map = headers(&[("User", "hank"), ("Password", "Bearer:abc:def")]);
        let token = extract_token(&map).unwrap().unwrap();
        assert_eq!(token.credential().expose_secret(), "abc:def");
    }

    #[test]
    fn test_password_empty_secret_accepted() {
        let map = headers(&[("User", "ivy"), ("Password", "prefix:")]);
        let token = extract_token(&map).unwrap().unwrap();
        assert!(token.has_empty_credential());
    }

    #[test]
    fn test_one_sided_user_password_is_malformed() {
        let only_user = headers(&[("User", "jack")]);
        assert!(matches!(
            extract_token(&only_user).unwrap_err(),
            RealmError::MalformedCredential(_)
        ));

        let only_password = headers(&[("Password", "pw")]);
        assert!(matches!(
            extract_token(&only_password).unwrap_err(),
            RealmError::MalformedCredential(_)
        ));

        let empty_user = headers(&[("User", ""), ("Password", "pw")]);
        assert!(matches!(
            extract_token(&empty_user).unwrap_err(),
            RealmError::MalformedCredential(_)
        ));
    }

    #[test]
    fn test_header_names_case_insensitive() {
        let map = headers(&[("authorization", &basic("kim:pw"))]);
        assert_eq!(extract_token(&map).unwrap().unwrap().principal(), "kim");

        let map = headers(&[("user", "lee"), ("PASSWORD", "pw")]);
        assert_eq!(extract_token(&map).unwrap().unwrap().principal(), "lee");
    }

    #[test]
    fn test_http_header_map() {
        let mut map = http::HeaderMap::new();
        map.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_str(&basic("mia:pw")).unwrap(),
        );
        let token = extract_token(&map).unwrap().unwrap();
        assert_eq!(token.principal(), "mia");
    }

    #[test]
    fn test_authorization_trailing_whitespace() {
        let value = format!("{} ", basic("nora:pw"));
        let map = headers(&[("Authorization", &value)]);
        let token = extract_token(&map).unwrap().unwrap();
        assert_eq!(token.principal(), "nora");
        assert_eq!(token.credential().expose_secret(), "pw");

        let map = headers(&[("Authorization", "Basic ")]);
        assert!(matches!(
            extract_token(&map).unwrap_err(),
            RealmError::MalformedCredential(_)
        ));
    }

    #[test]
    fn test_non_text_authorization_is_malformed() {
        let opaque = http::HeaderValue::from_bytes(b"Basic \xff\xfe").unwrap();

        let mut map = http::HeaderMap::new();
        map.insert(http::header::AUTHORIZATION, opaque);
        assert!(matches!(
            extract_token(&map).unwrap_err(),
            RealmError::MalformedCredential(_)
        ));

        // must not fall through to the proxy headers
        map.insert("User", http::HeaderValue::from_static("olga"));
        map.insert("Password", http::HeaderValue::from_static("pw"));
        assert!(matches!(
            extract_token(&map).unwrap_err(),
            RealmError::MalformedCredential(_)
        ));
    }

    #[test]
    fn test_non_text_password_is_malformed() {
        let mut map = http::HeaderMap::new();
        map.insert("User", http::HeaderValue::from_static("pat"));
        map.insert("Password", http::HeaderValue::from_bytes(b"x:\xff").unwrap());
        assert!(matches!(
            extract_token(&map).unwrap_err(),
            RealmError::MalformedCredential(_)
        ));
    }

    #[test]
    fn test_secret_from_password() {
        assert_eq!(secret_from_password("abc"), "abc");
        assert_eq!(secret_from_password("x:abc"), "abc");
        assert_eq!(secret_from_password(":abc"), "abc");
        assert_eq!(secret_from_password("x:"), "");
    }
}
