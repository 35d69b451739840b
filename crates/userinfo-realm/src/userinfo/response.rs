//! Userinfo success document

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identity claims returned by the provider's userinfo endpoint.
///
/// Known claims keep their wire names; anything else the provider sends is
/// kept in `additional`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfoResponse {
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Group memberships, in whatever shape the provider uses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<GroupsClaim>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Subject identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Tenant number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<i64>,

    /// Username at the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Additional claims
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

/// The `groups` claim: a single delimited string or a JSON array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupsClaim {
    /// e.g. `"admins,readers"`
    Delimited(String),
    /// e.g. `["admins", "readers"]`
    List(Vec<String>),
}
