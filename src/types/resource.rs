//! Resource kinds and cache keys.
//!
//! The upstream exposes two independent key spaces. A [`CacheKey`] always
//! carries its [`ResourceKind`], so a user id and an invite code with the
//! same text never share a cache slot.

use std::fmt;

use crate::{HuginnError, Result};

/// Shortest accepted user id, in digits.
const USER_ID_MIN_DIGITS: usize = 16;

/// Longest accepted user id, in digits.
const USER_ID_MAX_DIGITS: usize = 32;

/// Which upstream entity a key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A user, keyed by a 16–32 digit numeric id.
    User,
    /// An invite, keyed by an alphanumeric code.
    Invite,
}

impl ResourceKind {
    /// Lowercase name, used for logging and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Invite => "invite",
        }
    }

    /// Path of the resource on the upstream API, relative to its base URL.
    pub fn upstream_path(&self, key: &str) -> String {
        match self {
            Self::User => format!("/users/{key}"),
            Self::Invite => format!("/invites/{key}"),
        }
    }

    /// Check that `key` has the shape this kind accepts.
    pub fn validate_key(&self, key: &str) -> Result<()> {
        let valid = match self {
            Self::User => {
                (USER_ID_MIN_DIGITS..=USER_ID_MAX_DIGITS).contains(&key.len())
                    && key.bytes().all(|b| b.is_ascii_digit())
            }
            Self::Invite => !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric()),
        };
        if valid {
            Ok(())
        } else {
            Err(HuginnError::InvalidKey {
                kind: self.as_str(),
                key: key.to_owned(),
            })
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one cache entry: a resource kind plus its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: ResourceKind,
    key: String,
}

impl CacheKey {
    pub fn new(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Upstream path for this entry.
    pub fn upstream_path(&self) -> String {
        self.kind.upstream_path(&self.key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}
