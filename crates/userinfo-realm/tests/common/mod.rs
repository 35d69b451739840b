//! Common test utilities for integration tests
//!
//! Wraps a wiremock server standing in for an OAuth2 provider's userinfo
//! endpoint.

#![allow(dead_code)]

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use userinfo_realm::RealmConfig;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

pub const USERINFO_PATH: &str = "/oauth2/userinfo";

/// Userinfo mock server
pub struct MockUserInfoServer {
    pub server: MockServer,
    pub userinfo_endpoint: String,
}

impl MockUserInfoServer {
    /// Start a new mock provider
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let userinfo_endpoint = format!("{}{}", server.uri(), USERINFO_PATH);
        Self {
            server,
            userinfo_endpoint,
        }
    }

    /// Answer any userinfo request with `body`
    pub async fn mock_userinfo_success(&self, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer requests carrying `Bearer <token>` with a document for `username`
    pub async fn mock_userinfo_for_token(&self, token: &str, username: &str, groups: &str) {
        Mock::given(method("POST"))
            .and(path(USERINFO_PATH))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": format!("sub-{username}"),
                "username": username,
                "groups": groups,
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Structured OAuth2 error
    pub async fn mock_userinfo_json_error(&self, status: u16, error: &str, description: &str) {
        Mock::given(method("POST"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": error,
                "error_description": description,
            })))
            .mount(&self.server)
            .await;
    }

    /// Plain-text error
    pub async fn mock_userinfo_text_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Successful answer after `delay`
    pub async fn mock_userinfo_delayed(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(USERINFO_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"sub": "slow"}))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Fail the test on drop if any userinfo request arrives
    pub async fn expect_no_requests(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Realm configuration pointing at this server
    pub fn realm_config(&self) -> RealmConfig {
        RealmConfig::builder()
            .name("test-realm")
            .oauth_server("idp.example.com")
            .client_id("test-client")
            .user_info_url(self.userinfo_endpoint.as_str())
            .scope("openid")
            .scope("groups")
            .build()
            .expect("mock server config is valid")
    }
}

/// `Authorization: Basic base64(user:secret)` header value
pub fn basic_header(user: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{secret}")))
}
