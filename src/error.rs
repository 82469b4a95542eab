//! Error taxonomy shared by providers, the generic bot, and jobs.
//!
//! Every bot operation resolves to exactly one `Result`: data on success, one
//! of these variants on failure. Nothing in the framework swallows or retries
//! an error; it is handed to the caller as-is.

use serde_json::Value;
use std::time::Duration;

/// Errors surfaced by bot operations.
#[derive(Debug)]
pub enum BotError {
    /// Network or connection failure reported by the transport (opaque).
    Transport(String),
    /// The transport did not answer within the configured bound.
    Timeout(Duration),
    /// Provider answered with a non-success status. `body` is the decoded JSON
    /// error body, or the raw text as a JSON string when it is not JSON.
    Provider { status: u16, body: Value },
    /// Provider answered successfully but the body could not be decoded.
    Decode(String),
    /// An authenticated request was attempted with no access token loaded.
    MissingAccessToken,
    /// A refresh was requested but the current token carries no refresh token.
    MissingRefreshToken,
    /// A job name that is not registered was dispatched.
    UnknownJob(String),
}

impl BotError {
    /// Returns the provider status code, if this is a provider error.
    pub fn status(&self) -> Option<u16> {
        match self {
            BotError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotError::Transport(msg) => write!(f, "Transport error: {}", msg),
            BotError::Timeout(after) => {
                write!(f, "Request timed out after {}s", after.as_secs_f64())
            }
            BotError::Provider { status, body } => {
                write!(f, "Provider error (HTTP {}): {}", status, body)
            }
            BotError::Decode(msg) => write!(f, "Failed to decode response: {}", msg),
            BotError::MissingAccessToken => {
                write!(f, "No access token loaded; authorize the application first")
            }
            BotError::MissingRefreshToken => {
                write!(f, "Current access token has no refresh token")
            }
            BotError::UnknownJob(name) => write!(f, "Unknown job '{}'", name),
        }
    }
}

impl std::error::Error for BotError {}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Transport(err.to_string())
    }
}
