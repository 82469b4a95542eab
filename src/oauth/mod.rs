//! OAuth 2.0 authorization-code flow helpers.
//!
//! The flow as driven by the `authorize` command:
//! 1. `Bot::access_token_url` issues a state nonce and builds the consent URL
//! 2. The user authorizes on the provider's site
//! 3. The provider redirects to the configured callback URI, captured by
//!    [`CallbackListener`]
//! 4. The state is checked and consumed, the `code` is extracted
//! 5. `Bot::request_access_token` exchanges the code, the provider normalizes
//!    the payload into an `AccessTokenRecord`

mod callback;
mod state_manager;

pub use callback::CallbackListener;
pub use state_manager::{StateEntry, StateManager};

use crate::error::BotError;
use crate::transport::RawResponse;
use rand::{rngs::OsRng, RngCore};
use serde_json::Value;
use std::fmt::Write;

/// Random bytes behind each state nonce.
const STATE_BYTES: usize = 16;

/// Generates an anti-forgery state value: 16 bytes from the OS CSPRNG as 32
/// lowercase hex characters.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let mut state = String::with_capacity(STATE_BYTES * 2);
    for byte in bytes {
        let _ = write!(state, "{:02x}", byte);
    }
    state
}

/// Query parameters of an authorization redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRedirect {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AuthorizationRedirect {
    /// Parses the query string of an absolute or relative redirect URL.
    pub fn parse(url: &str) -> Self {
        let without_fragment = url.split('#').next().unwrap_or_default();
        match without_fragment.split_once('?') {
            Some((_, query)) => Self::from_query(query),
            None => Self::default(),
        }
    }

    /// Parses a bare query string (no leading `?`).
    ///
    /// A repeated parameter keeps its first value. A malformed query yields
    /// an empty redirect.
    pub fn from_query(query: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();

        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value.clone())
        };
        Self {
            code: first("code"),
            state: first("state"),
            error: first("error"),
            error_description: first("error_description"),
        }
    }
}

/// Returns the `code` parameter of a redirect URL, `None` when absent.
pub fn extract_code(redirect_url: &str) -> Option<String> {
    AuthorizationRedirect::parse(redirect_url).code
}

/// Maps a token-endpoint response to its outcome: the decoded payload on
/// HTTP 200, the decoded error body otherwise.
pub fn token_response(response: RawResponse) -> Result<Value, BotError> {
    if response.status_code == 200 {
        response.json()
    } else {
        Err(BotError::Provider {
            status: response.status_code,
            body: response.error_body(),
        })
    }
}
