//! Authenticated principal

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::userinfo::UserInfoResponse;

/// The resolved identity of an authenticated caller.
///
/// Produced fresh by every successful authentication; never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Username asserted by the caller and accepted by the provider
    pub username: String,
    /// Group memberships
    pub groups: BTreeSet<String>,
    /// Display name from the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Email from the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Provider identifiers (`sub`, `tenant`)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl User {
    /// A user with no groups or profile data
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            groups: BTreeSet::new(),
            full_name: None,
            email: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Replace the group set
    pub fn with_groups(mut self, groups: BTreeSet<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Whether the user belongs to `group`
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub(crate) fn from_userinfo(
        username: &str,
        groups: BTreeSet<String>,
        info: UserInfoResponse,
    ) -> Self {
        let mut user = Self::new(username).with_groups(groups);
        user.full_name = info.name;
        user.email = info.email;
        if let Some(sub) = info.sub {
            user.metadata.insert("sub".to_string(), Value::String(sub));
        }
        if let Some(tenant) = info.tenant {
            user.metadata.insert("tenant".to_string(), Value::from(tenant));
        }
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_userinfo() {
        let info = UserInfoResponse {
            email: Some("alice@example.com".to_string()),
            name: Some("Alice".to_string()),
            sub: Some("u-1".to_string()),
            tenant: Some(3),
            username: Some("provider-alice".to_string()),
            ..Default::default()
        };
        let groups = ["admins".to_string()].into_iter().collect();
        let user = User::from_userinfo("alice", groups, info);

        assert_eq!(user.username, "alice");
        assert!(user.has_group("admins"));
        assert!(!user.has_group("readers"));
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "username": "alice",
                "groups": ["admins"],
                "full_name": "Alice",
                "email": "alice@example.com",
                "metadata": {"sub": "u-1", "tenant": 3},
            })
        );
    }

    #[test]
    fn test_minimal_user_serialization() {
        let user = User::new("bob");
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({"username": "bob", "groups": []})
        );
    }
}
