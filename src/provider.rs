use crate::config::{BotDefaults, Configuration};
use crate::credentials::AccessTokenRecord;
use crate::oauth;
use crate::transport::{RawRequest, RawResponse, RequestDescriptor};
use serde_json::Value;

/// Provider-specific behavior plugged into the generic [`Bot`](crate::Bot).
///
/// Implementations are stateless: everything they need is passed in. The bot
/// owns the token, the transport and the rate-limit bookkeeping; a provider
/// only knows its own URLs, field names and headers.
///
/// # Example
/// ```no_run
/// use botkit::config::{BotDefaults, Configuration, HttpModule};
/// use botkit::credentials::AccessTokenRecord;
/// use botkit::transport::{Method, RawRequest, RawResponse, RequestDescriptor};
/// use botkit::Provider;
/// use serde_json::Value;
///
/// struct Example;
///
/// impl Provider for Example {
///     fn name(&self) -> &str {
///         "example"
///     }
///
///     fn defaults(&self) -> BotDefaults {
///         BotDefaults {
///             hostname: "api.example.com".to_string(),
///             http_module: HttpModule::Https,
///             path_prefix: "v1".to_string(),
///             port: 443,
///             default_remaining_request: 100,
///             default_remaining_time: 3600,
///         }
///     }
///
///     fn authorization_url(&self, defaults: &BotDefaults, config: &Configuration, state: &str, _scopes: &str) -> String {
///         format!("{}/authorize?state={}&client_id={}", defaults.origin(), state, config.app_id)
///     }
///
///     fn exchange_code(&self, config: &Configuration, code: &str) -> RawRequest {
///         RawRequest {
///             hostname: None,
///             method: Method::POST,
///             path: "token".to_string(),
///             path_prefix: String::new(),
///             post: vec![("code".to_string(), code.to_string())],
///         }
///     }
///
///     fn refresh_token(&self, config: &Configuration, refresh_token: &str) -> RawRequest {
///         unimplemented!()
///     }
///
///     fn normalize_token(&self, raw: &Value, scopes: &str) -> AccessTokenRecord {
///         AccessTokenRecord::bearer(raw["token"].as_str().unwrap_or_default(), "")
///     }
///
///     fn decorate_request(&self, request: &mut RequestDescriptor, token: &AccessTokenRecord) {
///         request.set_header("Authorization", format!("Bearer {}", token.access_token));
///     }
///
///     fn extract_rate_limit(&self, response: &RawResponse) -> i32 {
///         botkit::rate_limit::remaining_from_header(response.header("x-ratelimit-remaining"))
///     }
/// }
/// ```
pub trait Provider: Send + Sync {
    /// Lowercase provider identifier, used in logs.
    fn name(&self) -> &str;

    /// Host, scheme, prefix and budget defaults.
    fn defaults(&self) -> BotDefaults;

    /// Consent-screen URL embedding `state`. Must not perform I/O.
    fn authorization_url(
        &self,
        defaults: &BotDefaults,
        config: &Configuration,
        state: &str,
        scopes: &str,
    ) -> String;

    /// Token-endpoint request exchanging an authorization code. Carries client
    /// credentials, never a bearer token.
    fn exchange_code(&self, config: &Configuration, code: &str) -> RawRequest;

    /// Token-endpoint request for a refresh grant.
    fn refresh_token(&self, config: &Configuration, refresh_token: &str) -> RawRequest;

    /// Maps the provider's token payload to the canonical record. Total: it
    /// never fails, missing fields become empty.
    fn normalize_token(&self, raw: &Value, scopes: &str) -> AccessTokenRecord;

    /// Attaches `token` to an outgoing request.
    fn decorate_request(&self, request: &mut RequestDescriptor, token: &AccessTokenRecord);

    /// Remaining-request quota reported by `response`.
    fn extract_rate_limit(&self, response: &RawResponse) -> i32;

    /// Authorization code carried by a redirect URL.
    fn extract_code(&self, redirect_url: &str) -> Option<String> {
        oauth::extract_code(redirect_url)
    }

    /// Strips any response envelope around the payload.
    fn unwrap_payload(&self, body: Value) -> Value {
        body
    }
}
