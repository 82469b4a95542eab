//! Issued-state bookkeeping for CSRF protection.
//!
//! Every nonce embedded in an authorization URL is remembered until it is
//! either consumed by the matching redirect or expires.

use super::generate_state;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Default lifetime of an issued state (10 minutes).
pub const DEFAULT_STATE_EXPIRY_SECS: i64 = 600;

#[derive(Clone, Debug)]
pub struct StateEntry {
    /// Application the authorization URL was built for
    pub application: String,
    pub created_at: DateTime<Utc>,
}

/// Single-use state registry with expiry.
#[derive(Clone)]
pub struct StateManager {
    states: Arc<Mutex<HashMap<String, StateEntry>>>,
    expiry_duration: Duration,
}

impl StateManager {
    pub fn new(expiry_seconds: i64) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            expiry_duration: Duration::seconds(expiry_seconds),
        }
    }

    /// Generates and remembers a fresh state for `application`.
    ///
    /// Expired entries are dropped on the way.
    pub fn issue(&self, application: &str) -> String {
        let state = generate_state();
        let now = Utc::now();

        let mut states = self.states.lock().unwrap();
        states.retain(|_, entry| now - entry.created_at <= self.expiry_duration);
        states.insert(
            state.clone(),
            StateEntry {
                application: application.to_string(),
                created_at: now,
            },
        );

        state
    }

    /// Removes `state` and returns its entry if it was issued and is still
    /// fresh. A state can be consumed once.
    pub fn validate_and_consume(&self, state: &str) -> Option<StateEntry> {
        let entry = self.states.lock().unwrap().remove(state)?;

        if Utc::now() - entry.created_at > self.expiry_duration {
            return None;
        }

        Some(entry)
    }

    /// Number of outstanding states
    pub fn count(&self) -> usize {
        self.states.lock().unwrap().len()
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_EXPIRY_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let manager = StateManager::default();
        let state = manager.issue("main");
        assert_eq!(state.len(), 32);

        let entry = manager.validate_and_consume(&state).unwrap();
        assert_eq!(entry.application, "main");
    }

    #[test]
    fn test_state_is_single_use() {
        let manager = StateManager::default();
        let state = manager.issue("main");

        assert!(manager.validate_and_consume(&state).is_some());
        assert!(manager.validate_and_consume(&state).is_none());
    }

    #[test]
    fn test_unknown_state_rejected() {
        let manager = StateManager::default();
        manager.issue("main");
        assert!(manager.validate_and_consume("0123456789abcdef0123456789abcdef").is_none());
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_expired_state_rejected_and_pruned() {
        let manager = StateManager::new(0);
        let stale = manager.issue("main");

        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(manager.validate_and_consume(&stale).is_none());

        manager.issue("main");
        std::thread::sleep(std::time::Duration::from_millis(10));
        // Issuing prunes the expired entry
        manager.issue("main");
        assert_eq!(manager.count(), 1);
    }
}
