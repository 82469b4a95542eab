use crate::config::{self, AUTHORIZE_PATH, RATE_LIMIT_HEADER, TOKEN_PATH};
use botkit::config::{BotDefaults, Configuration};
use botkit::credentials::AccessTokenRecord;
use botkit::rate_limit::remaining_from_header;
use botkit::transport::{Method, RawRequest, RawResponse, RequestDescriptor};
use botkit::Provider;
use serde_json::Value;

/// Imgur flavor of the OAuth2 bot: consent URL, token grants, bearer
/// header and per-user rate-limit header.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImgurProvider;

impl ImgurProvider {
    fn token_request(config: &Configuration, grant: &[(&str, &str)]) -> RawRequest {
        let mut post = vec![
            ("client_id".to_string(), config.app_id.clone()),
            ("client_secret".to_string(), config.app_secret.clone()),
        ];
        post.extend(grant.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        RawRequest {
            hostname: None,
            method: Method::POST,
            path: TOKEN_PATH.to_string(),
            path_prefix: String::new(),
            post,
        }
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl Provider for ImgurProvider {
    fn name(&self) -> &str {
        "imgur"
    }

    fn defaults(&self) -> BotDefaults {
        config::imgur_defaults()
    }

    // Imgur ignores requested scopes on the consent screen.
    fn authorization_url(
        &self,
        defaults: &BotDefaults,
        config: &Configuration,
        state: &str,
        _scopes: &str,
    ) -> String {
        format!(
            "{}?response_type=code&state={}&client_id={}",
            defaults.resolve_url(None, "", AUTHORIZE_PATH),
            state,
            urlencoding::encode(&config.app_id)
        )
    }

    fn exchange_code(&self, config: &Configuration, code: &str) -> RawRequest {
        Self::token_request(
            config,
            &[("grant_type", "authorization_code"), ("code", code)],
        )
    }

    fn refresh_token(&self, config: &Configuration, refresh_token: &str) -> RawRequest {
        Self::token_request(
            config,
            &[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
        )
    }

    /// Maps `access_token`, `token_type`, `account_username`, `scope` and
    /// `refresh_token`. A missing or null `scope` falls back to the requested
    /// `scopes`.
    fn normalize_token(&self, raw: &Value, scopes: &str) -> AccessTokenRecord {
        AccessTokenRecord {
            access_token: string_field(raw, "access_token").unwrap_or_default(),
            token_type: string_field(raw, "token_type").unwrap_or_default(),
            user: string_field(raw, "account_username").unwrap_or_default(),
            scopes: string_field(raw, "scope").unwrap_or_else(|| scopes.to_string()),
            refresh_token: string_field(raw, "refresh_token"),
        }
    }

    fn decorate_request(&self, request: &mut RequestDescriptor, token: &AccessTokenRecord) {
        request.set_header("Authorization", format!("Bearer {}", token.access_token));
    }

    fn extract_rate_limit(&self, response: &RawResponse) -> i32 {
        remaining_from_header(response.header(RATE_LIMIT_HEADER))
    }

    /// Unwraps Imgur's `{"data": …, "success": …, "status": …}` envelope.
    fn unwrap_payload(&self, body: Value) -> Value {
        match body {
            Value::Object(mut map) if map.contains_key("data") && map.contains_key("success") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}
