//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Authorization service configuration.
    pub gateway: GatewayConfig,
    /// PIN capture behaviour.
    #[serde(default)]
    pub pin: PinConfig,
    /// Where the auth credential comes from.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Authorization service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the authorization service, e.g. `https://api.example.com`.
    pub base_url: String,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Endpoint paths relative to `base_url`.
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

fn default_connect_timeout() -> u64 {
    10
}

/// Endpoint paths of the authorization service.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Verifies the current PIN.
    #[serde(default = "default_verify_path")]
    pub verify_current: String,
    /// Persists a new PIN.
    #[serde(default = "default_commit_path")]
    pub commit_new: String,
    /// Validates a PIN and executes a pending action in one call.
    #[serde(default = "default_execute_path")]
    pub execute_action: String,
}

fn default_verify_path() -> String {
    "/api/v1/pin/verify".to_string()
}

fn default_commit_path() -> String {
    "/api/v1/pin/change".to_string()
}

fn default_execute_path() -> String {
    "/api/v1/transfers/confirm".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            verify_current: default_verify_path(),
            commit_new: default_commit_path(),
            execute_action: default_execute_path(),
        }
    }
}

/// PIN capture behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct PinConfig {
    /// Submit as soon as the last digit is entered.
    #[serde(default = "default_auto_submit")]
    pub auto_submit: bool,
    /// Client-side timeout for each authorization call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_auto_submit() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    20
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            auto_submit: default_auto_submit(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Sources of the auth credential.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// File holding the bearer token persisted by the login flow.
    pub token_file: Option<PathBuf>,
    /// Inline bearer token, used when no token file is configured.
    pub bearer_token: Option<String>,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Value of the session cookie.
    pub session_cookie: Option<String>,
}

fn default_cookie_name() -> String {
    "session".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_file: None,
            bearer_token: None,
            cookie_name: default_cookie_name(),
            session_cookie: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PINGATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
