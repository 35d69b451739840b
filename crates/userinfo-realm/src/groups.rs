//! Group derivation from a userinfo response

use std::collections::BTreeSet;
use std::fmt;

use crate::userinfo::{GroupsClaim, UserInfoResponse};

/// Maps an accepted userinfo response to the principal's group names
pub trait GroupResolver: Send + Sync + fmt::Debug {
    /// Groups for `principal`; may be empty
    fn resolve(&self, principal: &str, info: &UserInfoResponse) -> BTreeSet<String>;
}

/// Grants no groups
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGroups;

impl GroupResolver for NoGroups {
    fn resolve(&self, _principal: &str, _info: &UserInfoResponse) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Reads the `groups` claim.
///
/// A delimited string is split on the configured delimiters and on
/// whitespace. List entries are taken as-is. Entries are trimmed, empty
/// entries dropped and duplicates collapsed.
#[derive(Debug, Clone)]
pub struct ClaimGroups {
    delimiters: Vec<char>,
}

impl ClaimGroups {
    /// Delimiters used when none are configured
    pub const DEFAULT_DELIMITERS: &'static str = ",;";

    /// Split on the characters of `delimiters` (and whitespace)
    pub fn new(delimiters: &str) -> Self {
        Self {
            delimiters: delimiters.chars().collect(),
        }
    }

    fn is_delimiter(&self, c: char) -> bool {
        c.is_whitespace() || self.delimiters.contains(&c)
    }
}

impl Default for ClaimGroups {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELIMITERS)
    }
}

impl GroupResolver for ClaimGroups {
    fn resolve(&self, _principal: &str, info: &UserInfoResponse) -> BTreeSet<String> {
        match &info.groups {
            None => BTreeSet::new(),
            Some(GroupsClaim::Delimited(raw)) => raw
                .split(|c: char| self.is_delimiter(c))
                .filter(|group| !group.is_empty())
                .map(str::to_string)
                .collect(),
            Some(GroupsClaim::List(groups)) => groups
                .iter()
                .map(|group| group.trim())
                .filter(|group| !group.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}
