//! OAuth2 userinfo exchange
//!
//! The wire half of the realm: a [`UserInfoRequest`] POSTs to the provider's
//! userinfo endpoint with the caller's secret as a bearer token and yields
//! either a [`UserInfoResponse`] or a typed [`UserInfoResponseError`].

mod error_response;
mod exception;
mod interceptor;
mod request;
mod response;

pub use error_response::{ErrorCode, UserInfoErrorResponse};
pub use exception::UserInfoResponseError;
pub use interceptor::{
    BasicAuthentication, BearerToken, ClientParametersAuthentication, PreparedRequest,
    RequestInitializer, RequestInterceptor,
};
pub use request::{UnparsedResponse, UserInfoRequest};
pub use response::{GroupsClaim, UserInfoResponse};
