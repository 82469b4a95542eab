//! The generic bot: one provider, one transport, one application
//! configuration, and the access token currently in use.
//!
//! ```text
//! capability ──▶ prepare_request ──▶ decorate (Provider) ──▶ do_request
//!                                                              │
//!                        Transport::send (bounded timeout) ◀───┘
//!                                │
//!                 RawResponse ──▶ status check ──▶ extract_rate_limit ──▶ RateLimitTracker
//!                                      │
//!                                      └──▶ unwrap_payload ──▶ Model
//! ```

use crate::config::{BotDefaults, Configuration};
use crate::credentials::{AccessTokenRecord, TokenCell};
use crate::error::BotError;
use crate::model::Model;
use crate::oauth::{self, StateManager};
use crate::provider::Provider;
use crate::rate_limit::RateLimitTracker;
use crate::transport::{HttpRequest, RawRequest, RawResponse, RequestDescriptor, Transport};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default bound on every transport call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Bot {
    provider: Arc<dyn Provider>,
    transport: Arc<dyn Transport>,
    defaults: BotDefaults,
    configuration: Configuration,
    token: TokenCell,
    rate_limits: RateLimitTracker,
    states: StateManager,
    request_timeout: Duration,
}

impl Bot {
    /// Creates a bot acting as `configuration`, using the provider's defaults.
    pub fn new(
        provider: Arc<dyn Provider>,
        transport: Arc<dyn Transport>,
        configuration: Configuration,
    ) -> Self {
        let defaults = provider.defaults();
        let rate_limits = tracker_for(&defaults);
        Self {
            provider,
            transport,
            defaults,
            configuration,
            token: TokenCell::new(),
            rate_limits,
            states: StateManager::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replaces the provider defaults (e.g. to target a mock server).
    pub fn with_defaults(mut self, defaults: BotDefaults) -> Self {
        self.rate_limits = tracker_for(&defaults);
        self.defaults = defaults;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn defaults(&self) -> &BotDefaults {
        &self.defaults
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    // ── Access token ─────────────────────────────────────────────────────────

    /// Snapshot of the current token.
    pub fn access_token(&self) -> Option<Arc<AccessTokenRecord>> {
        self.token.current()
    }

    /// Publishes `record` as the current token, replacing any previous one.
    pub fn set_access_token(&self, record: AccessTokenRecord) {
        debug!(
            application = %self.configuration.name,
            user = %record.user,
            "Access token loaded"
        );
        self.token.replace(record);
    }

    // ── Authorization ────────────────────────────────────────────────────────

    /// Consent-screen URL with a freshly issued state nonce.
    pub fn access_token_url(&self, scopes: &str) -> String {
        let state = self.states.issue(&self.configuration.name);
        self.provider
            .authorization_url(&self.defaults, &self.configuration, &state, scopes)
    }

    /// Consumes `state` and reports whether this bot issued it (and it has not
    /// expired).
    pub fn verify_state(&self, state: &str) -> bool {
        match self.states.validate_and_consume(state) {
            Some(entry) => entry.application == self.configuration.name,
            None => false,
        }
    }

    /// Authorization code carried by the redirect URL, `None` when absent.
    pub fn extract_response_data_for_access_token(&self, redirect_url: &str) -> Option<String> {
        self.provider.extract_code(redirect_url)
    }

    /// Exchanges an authorization code for the provider's raw token payload.
    pub async fn request_access_token(&self, code: &str) -> Result<Value, BotError> {
        let request = self.provider.exchange_code(&self.configuration, code);
        let response = self.request(request).await?;
        oauth::token_response(response)
    }

    /// Normalizes a raw token payload into the canonical record.
    pub fn format_new_access_token(&self, raw: &Value, scopes: &str) -> AccessTokenRecord {
        self.provider.normalize_token(raw, scopes)
    }

    /// Runs a refresh grant and publishes the resulting record.
    ///
    /// The previous refresh token is kept when the provider does not rotate it.
    pub async fn refresh_access_token(&self) -> Result<Arc<AccessTokenRecord>, BotError> {
        let current = self.token.current().ok_or(BotError::MissingAccessToken)?;
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or(BotError::MissingRefreshToken)?;

        let request = self.provider.refresh_token(&self.configuration, refresh_token);
        let raw = oauth::token_response(self.request(request).await?)?;

        let mut record = self.provider.normalize_token(&raw, &current.scopes);
        if record.refresh_token.is_none() {
            record.refresh_token = current.refresh_token.clone();
        }
        if record.user.is_empty() {
            record.user = current.user.clone();
        }

        info!(
            application = %self.configuration.name,
            user = %record.user,
            "Access token refreshed"
        );
        self.token.replace(record);
        self.token.current().ok_or(BotError::MissingAccessToken)
    }

    // ── Requests ─────────────────────────────────────────────────────────────

    /// Attaches the current token to `descriptor`.
    ///
    /// Fails with [`BotError::MissingAccessToken`] rather than letting an
    /// unauthenticated request through.
    pub fn decorate(&self, descriptor: &mut RequestDescriptor) -> Result<(), BotError> {
        let token = self.token.current().ok_or(BotError::MissingAccessToken)?;
        self.provider.decorate_request(descriptor, &token);
        Ok(())
    }

    /// Decorates and sends a capability request.
    pub async fn prepare_request<M: Model>(
        &self,
        mut descriptor: RequestDescriptor,
    ) -> Result<M, BotError> {
        self.decorate(&mut descriptor)?;
        self.do_request(descriptor).await
    }

    /// Sends `descriptor` below the default host and prefix, records the
    /// rate limit reported by a successful response and decodes the payload
    /// into `M`.
    pub async fn do_request<M: Model>(&self, descriptor: RequestDescriptor) -> Result<M, BotError> {
        let mut url = self
            .defaults
            .resolve_url(None, &self.defaults.path_prefix, &descriptor.path);
        if !descriptor.query.is_empty() {
            url.push('?');
            url.push_str(&encode_query(&descriptor.query));
        }

        let response = self
            .send(HttpRequest {
                method: descriptor.method,
                url,
                headers: descriptor.headers,
                form: None,
            })
            .await?;

        if !response.is_success() {
            return Err(BotError::Provider {
                status: response.status_code,
                body: response.error_body(),
            });
        }
        self.record_rate_limit(&response);

        let body = response.json()?;
        Ok(M::from_json(self.provider.unwrap_payload(body)))
    }

    /// Sends a raw request (explicit host/prefix, form body, no bearer token)
    /// and returns the response without interpreting its status.
    pub async fn request(&self, request: RawRequest) -> Result<RawResponse, BotError> {
        let url = self.defaults.resolve_url(
            request.hostname.as_deref(),
            &request.path_prefix,
            &request.path,
        );
        let form = if request.post.is_empty() {
            None
        } else {
            Some(request.post)
        };

        self.send(HttpRequest {
            method: request.method,
            url,
            headers: BTreeMap::new(),
            form,
        })
        .await
    }

    /// Last reported remaining-request count for this account.
    pub fn remaining_requests(&self) -> i64 {
        self.rate_limits.remaining(&self.account_key())
    }

    async fn send(&self, request: HttpRequest) -> Result<RawResponse, BotError> {
        match tokio::time::timeout(self.request_timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    application = %self.configuration.name,
                    timeout_secs = self.request_timeout.as_secs_f64(),
                    "Request timed out"
                );
                Err(BotError::Timeout(self.request_timeout))
            }
        }
    }

    fn record_rate_limit(&self, response: &RawResponse) {
        let remaining = self.provider.extract_rate_limit(response);
        debug!(
            provider = %self.provider.name(),
            remaining = remaining,
            "Rate limit observed"
        );
        self.rate_limits.record(&self.account_key(), i64::from(remaining));
    }

    fn account_key(&self) -> String {
        match self.token.current() {
            Some(token) if !token.user.is_empty() => {
                format!("{}/{}", self.configuration.name, token.user)
            }
            _ => self.configuration.name.clone(),
        }
    }
}

fn tracker_for(defaults: &BotDefaults) -> RateLimitTracker {
    RateLimitTracker::new(
        defaults.default_remaining_request,
        Duration::from_secs(defaults.default_remaining_time),
    )
}

fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
