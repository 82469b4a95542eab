//! Access tokens: the canonical record, the per-bot holder, and encrypted
//! persistence.
//!
//! # Architecture
//!
//! ```text
//! provider token response ──normalize──▶ AccessTokenRecord
//!                                              │
//!                         ┌────────────────────┴───────────────────┐
//!                         ▼                                        ▼
//!               TokenCell (in memory)                    TokenStore (SQLite)
//!  - one per Bot                             - keyed by (application, user)
//!  - readers clone an Arc snapshot           - tokens sealed with AES-256-GCM
//!  - refresh swaps in a new Arc              - upsert on store
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

mod encryption;
mod storage;

pub use encryption::{validate_key, Cipher, Sealed};
pub use storage::TokenStore;

/// Canonical, provider-independent OAuth token.
///
/// Built by a provider's token normalizer; never mutated once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    /// Bearer token sent on authenticated requests
    pub access_token: String,

    /// Token type as reported by the provider (usually "bearer")
    #[serde(rename = "type")]
    pub token_type: String,

    /// Account the token was issued for
    pub user: String,

    /// Scopes granted
    pub scopes: String,

    /// Refresh token, when the provider issued one
    pub refresh_token: Option<String>,
}

impl AccessTokenRecord {
    /// Record for a bearer token issued out of band (e.g. pasted into config).
    pub fn bearer(access_token: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
            user: user.into(),
            scopes: String::new(),
            refresh_token: None,
        }
    }
}

/// Holder for the current access token of one bot.
///
/// Readers get an `Arc` snapshot that stays valid even if a refresh replaces
/// the record while their request is in flight.
#[derive(Debug, Default)]
pub struct TokenCell {
    current: RwLock<Option<Arc<AccessTokenRecord>>>,
}

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<AccessTokenRecord>> {
        self.current.read().unwrap().clone()
    }

    /// Publishes `record`, returning the one it replaced.
    pub fn replace(&self, record: AccessTokenRecord) -> Option<Arc<AccessTokenRecord>> {
        self.current.write().unwrap().replace(Arc::new(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(token: &str) -> AccessTokenRecord {
        AccessTokenRecord {
            access_token: token.to_string(),
            token_type: "bearer".to_string(),
            user: "alice".to_string(),
            scopes: "".to_string(),
            refresh_token: Some("R".to_string()),
        }
    }

    #[test]
    fn test_record_serializes_type_field() {
        let json = serde_json::to_value(record("T")).unwrap();
        assert_eq!(json["type"], "bearer");
        assert_eq!(json["access_token"], "T");
        assert_eq!(json["refresh_token"], "R");
        assert!(json.get("token_type").is_none());
    }

    #[test]
    fn test_empty_cell() {
        let cell = TokenCell::new();
        assert!(cell.current().is_none());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let cell = TokenCell::new();
        cell.replace(record("old"));

        let in_flight = cell.current().unwrap();
        let previous = cell.replace(record("new")).unwrap();

        assert_eq!(in_flight.access_token, "old");
        assert_eq!(previous.access_token, "old");
        assert_eq!(cell.current().unwrap().access_token, "new");
    }

    #[test]
    fn test_bearer_constructor() {
        let record = AccessTokenRecord::bearer("abc", "bob");
        assert_eq!(record.token_type, "bearer");
        assert_eq!(record.user, "bob");
        assert!(record.refresh_token.is_none());
    }
}
