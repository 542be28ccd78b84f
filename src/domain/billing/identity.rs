//! User identity for billing records.
//!
//! Two identity families share one store: web users are keyed by email
//! address, app users by an opaque external token minted by the client
//! application. The variants carry different write contracts (see
//! [`UserIdentity::is_upsertable`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity a billing record is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UserIdentity {
    /// Email address of a web user. Update-only against the authoritative
    /// store: the record is created by the signup process, never here.
    Email(String),
    /// Opaque app-internal user token. The token itself is the key, so a
    /// first write may create the record (via the cache path).
    ExternalToken(String),
}

impl UserIdentity {
    /// Builds an email identity, normalizing to lowercase.
    pub fn email(addr: impl Into<String>) -> Self {
        Self::Email(addr.into().trim().to_lowercase())
    }

    /// Builds a token identity. Tokens are opaque and kept verbatim.
    pub fn external_token(token: impl Into<String>) -> Self {
        Self::ExternalToken(token.into())
    }

    /// The raw key string this identity stores under.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(s) | Self::ExternalToken(s) => s,
        }
    }

    /// Whether a missing record may be created on write.
    ///
    /// Token identities are upsert-capable; email identities are
    /// update-only and a missing row is a logged no-op.
    pub fn is_upsertable(&self) -> bool {
        matches!(self, Self::ExternalToken(_))
    }

    /// Parses a raw identity string: anything containing `@` is treated
    /// as an email, everything else as an external token.
    pub fn parse(raw: &str) -> Self {
        if raw.contains('@') {
            Self::email(raw)
        } else {
            Self::external_token(raw)
        }
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of identity resolution over an event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedIdentity {
    /// A stable identity was found.
    Known(UserIdentity),
    /// No token, no email, no stored customer association. The event is
    /// dropped without error.
    Unresolved,
}

impl ResolvedIdentity {
    pub fn known(self) -> Option<UserIdentity> {
        match self {
            Self::Known(identity) => Some(identity),
            Self::Unresolved => None,
        }
    }
}
