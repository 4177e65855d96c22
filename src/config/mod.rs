//! Configuration (layered: flags > env > `.env` file > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::auth::error::AuthError;
use crate::auth::store::TokenStoreConfig;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3005";
pub const DEFAULT_SCOPE: &str = "openid profile email";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_SERVER_URL: &str = "ORBIT_SERVER_URL";
const ENV_CLIENT_ID: &str = "ORBIT_CLIENT_ID";
const ENV_LEGACY_CLIENT_ID: &str = "GITHUB_CLIENT_ID";
const ENV_SCOPE: &str = "ORBIT_SCOPE";
const ENV_CONFIG_DIR: &str = "ORBIT_CONFIG_DIR";
const ENV_HTTP_TIMEOUT: &str = "ORBIT_HTTP_TIMEOUT_SECS";

/// Values supplied explicitly (usually CLI flags). Unset fields fall through
/// to the environment.
///
/// # Example
/// ```
/// use orbit::config::{ConfigOverrides, OrbitConfig};
///
/// let overrides = ConfigOverrides::builder()
///     .server_url("https://auth.example.com".to_string())
///     .build();
/// let config = OrbitConfig::from_lookup(|_| None).with_overrides(overrides);
/// assert_eq!(config.server_url, "https://auth.example.com");
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub client_id: Option<String>,
    pub scope: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub http_timeout: Option<Duration>,
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrbitConfig {
    pub server_url: String,
    pub client_id: Option<String>,
    pub scope: String,
    pub config_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            client_id: None,
            scope: DEFAULT_SCOPE.to_string(),
            config_dir: TokenStoreConfig::default_dir(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl OrbitConfig {
    /// Load from process environment, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // missing .env is fine
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = get(ENV_SERVER_URL) {
            config.server_url = url;
        }
        config.client_id = get(ENV_CLIENT_ID).or_else(|| get(ENV_LEGACY_CLIENT_ID));
        if let Some(scope) = get(ENV_SCOPE) {
            config.scope = scope;
        }
        if let Some(dir) = get(ENV_CONFIG_DIR) {
            config.config_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(ENV_HTTP_TIMEOUT) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(key = ENV_HTTP_TIMEOUT, value = %raw, "ignoring invalid timeout"),
            }
        }
        config
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank(overrides.server_url) {
            self.server_url = url;
        }
        if let Some(client_id) = non_blank(overrides.client_id) {
            self.client_id = Some(client_id);
        }
        if let Some(scope) = non_blank(overrides.scope) {
            self.scope = scope;
        }
        if let Some(dir) = overrides.config_dir {
            self.config_dir = dir;
        }
        if let Some(timeout) = overrides.http_timeout {
            self.http_timeout = timeout;
        }
        self
    }

    pub fn token_store_config(&self) -> TokenStoreConfig {
        TokenStoreConfig::new(self.config_dir.clone())
    }

    pub fn require_client_id(&self) -> Result<&str, AuthError> {
        self.client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingClientId)
    }
}
