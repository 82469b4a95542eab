use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Scheme used to reach a provider API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpModule {
    Http,
    Https,
}

impl HttpModule {
    pub fn scheme(&self) -> &'static str {
        match self {
            HttpModule::Http => "http",
            HttpModule::Https => "https",
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            HttpModule::Http => 80,
            HttpModule::Https => 443,
        }
    }
}

/// Provider-level request defaults consumed by the transport base.
///
/// Each provider declares its own set; tests override `hostname`, `port` and
/// `http_module` to point at a local mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotDefaults {
    pub hostname: String,
    pub http_module: HttpModule,
    /// Prefix joined before every capability path (e.g. API version `"3"`).
    pub path_prefix: String,
    pub port: u16,
    /// Remaining-request budget assumed before the first response is seen.
    pub default_remaining_request: i64,
    /// Seconds after which an observed budget is considered reset.
    pub default_remaining_time: u64,
}

impl BotDefaults {
    /// `{scheme}://{hostname}`, with `:{port}` only when it differs from the
    /// scheme's default port.
    pub fn origin(&self) -> String {
        if self.port == self.http_module.default_port() {
            format!("{}://{}", self.http_module.scheme(), self.hostname)
        } else {
            format!(
                "{}://{}:{}",
                self.http_module.scheme(),
                self.hostname,
                self.port
            )
        }
    }

    /// Joins origin, prefix and path, skipping empty segments.
    pub fn resolve_url(&self, hostname: Option<&str>, path_prefix: &str, path: &str) -> String {
        let origin = match hostname {
            Some(host) if host != self.hostname => BotDefaults {
                hostname: host.to_string(),
                ..self.clone()
            }
            .origin(),
            _ => self.origin(),
        };

        let mut url = origin;
        for segment in [path_prefix, path] {
            let segment = segment.trim_matches('/');
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }
}

/// One application/account pair the bot can act as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub app_id: String,
    pub app_secret: String,
    /// Pre-issued bearer token, used when no stored token exists for the user.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Redirect URI registered with the provider.
    #[serde(default)]
    pub callback_uri: String,
    /// Space-separated scopes requested during authorization.
    #[serde(default)]
    pub scopes: String,
}

/// Complete bot configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Upper bound on every transport call (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// SQLite file holding encrypted access tokens.
    #[serde(default = "default_token_db")]
    pub token_db: String,
    #[serde(default)]
    pub applications: Vec<Configuration>,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_token_db() -> String {
    "tokens.db".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            token_db: default_token_db(),
            applications: Vec::new(),
        }
    }
}

impl BotConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Selects the application configuration named `name`.
    pub fn select(&self, name: &str) -> Result<Configuration> {
        self.applications
            .iter()
            .find(|app| app.name == name)
            .cloned()
            .ok_or_else(|| {
                let known: Vec<&str> = self.applications.iter().map(|a| a.name.as_str()).collect();
                anyhow!(
                    "Application '{}' not found in configuration (known: {})",
                    name,
                    known.join(", ")
                )
            })
    }
}

/// Load configuration from TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BotConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: BotConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
