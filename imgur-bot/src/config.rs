use botkit::config::{BotDefaults, HttpModule};

pub const HOSTNAME: &str = "api.imgur.com";
pub const PATH_PREFIX: &str = "3";
pub const PORT: u16 = 443;
pub const DEFAULT_REMAINING_REQUEST: i64 = 1250;
pub const DEFAULT_REMAINING_TIME: u64 = 60 * 60 * 24;

pub const AUTHORIZE_PATH: &str = "oauth2/authorize";
pub const TOKEN_PATH: &str = "oauth2/token";

/// Header carrying the per-user remaining request count.
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-userremaining";

/// Request defaults for the public Imgur API.
pub fn imgur_defaults() -> BotDefaults {
    BotDefaults {
        hostname: HOSTNAME.to_string(),
        http_module: HttpModule::Https,
        path_prefix: PATH_PREFIX.to_string(),
        port: PORT,
        default_remaining_request: DEFAULT_REMAINING_REQUEST,
        default_remaining_time: DEFAULT_REMAINING_TIME,
    }
}
