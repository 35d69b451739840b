//! # userinfo-realm - OAuth2 Userinfo Authentication Realm
//!
//! A pluggable authentication realm that decides whether an inbound request
//! is authenticated by presenting the caller's secret as a bearer token to an
//! OAuth2 provider's userinfo endpoint.
//!
//! ## Flow
//!
//! 1. **Extract** a username/secret token from request headers
//!    (`Authorization: <scheme> base64(user:secret)` or `User` + `Password`)
//! 2. **Exchange** the secret at the userinfo endpoint (form POST,
//!    `Authorization: Bearer <secret>`)
//! 3. **Decide**: a 2xx userinfo document becomes a [`User`] with groups;
//!    anything else becomes a rejection
//!
//! ## Architecture
//!
//! - [`extract`] - Header parsing into [`UsernamePasswordToken`]
//! - [`token`] - Credential types
//! - [`userinfo`] - Userinfo request/response model and request interceptors
//! - [`transport`] - `reqwest` transport with redirects disabled
//! - [`realm`] - The [`Realm`] trait and [`OAuthRealm`]
//! - [`groups`] - Group derivation from the userinfo document
//! - [`config`] - [`RealmConfig`] from environment, file or builder
//! - [`error`] - [`RealmError`] taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use userinfo_realm::{OAuthRealm, Realm, RealmConfig};
//!
//! # async fn example() -> Result<(), userinfo_realm::RealmError> {
//! let realm = OAuthRealm::new(RealmConfig::from_env()?)?;
//!
//! let mut headers = HashMap::new();
//! headers.insert("User".to_string(), "alice".to_string());
//! headers.insert("Password".to_string(), "access-token".to_string());
//!
//! if let Some(token) = realm.extract_token(&headers)? {
//!     match realm.authenticate(&token).await {
//!         Ok(user) => println!("{} in {:?}", user.username, user.groups),
//!         Err(e) => println!("denied: {}", e.client_message()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Standards
//!
//! - **RFC 6749** - OAuth 2.0 error codes and client authentication
//! - **RFC 6750** - Bearer token usage
//! - **OpenID Connect Core 5.3** - Userinfo endpoint

pub mod config;
pub mod error;
pub mod extract;
pub mod groups;
pub mod realm;
pub mod token;
pub mod transport;
pub mod user;
pub mod userinfo;

#[doc(inline)]
pub use config::{RealmConfig, RealmConfigBuilder};

#[doc(inline)]
pub use error::{RealmError, RealmErrorKind, RealmResult};

#[doc(inline)]
pub use extract::{AUTH_HEADER, HeaderLookup, PASSWORD_HEADER, USER_HEADER, extract_token};

#[doc(inline)]
pub use groups::{ClaimGroups, GroupResolver, NoGroups};

#[doc(inline)]
pub use realm::{AuthenticationOutcome, OAuthRealm, REALM_TYPE, Realm};

#[doc(inline)]
pub use token::{AuthenticationToken, UsernamePasswordToken};

#[doc(inline)]
pub use transport::{DEFAULT_TIMEOUT, HttpTransport};

#[doc(inline)]
pub use user::User;

#[doc(inline)]
pub use userinfo::{
    BasicAuthentication, BearerToken, ClientParametersAuthentication, ErrorCode, GroupsClaim,
    PreparedRequest, RequestInitializer, RequestInterceptor, UnparsedResponse,
    UserInfoErrorResponse, UserInfoRequest, UserInfoResponse, UserInfoResponseError,
};
