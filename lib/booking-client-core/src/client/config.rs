use std::env;
use std::time::Duration;

use tracing::info;

/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "BOOKING_API_BASE_URL";
/// Environment variable holding the request timeout in milliseconds.
pub const ENV_TIMEOUT: &str = "BOOKING_REQUEST_TIMEOUT";
/// Environment variable holding the application title.
pub const ENV_APP_TITLE: &str = "BOOKING_APP_TITLE";
/// Environment variable enabling debug output when set to `true`.
pub const ENV_DEBUG: &str = "BOOKING_DEBUG";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
const DEFAULT_APP_NAME: &str = "Activity Booking";

/// Client settings.
///
/// # Default Configuration
///
/// - **Base URL**: `http://localhost:8000/api`
/// - **Timeout**: 10 seconds
/// - **Login page**: `/pages/login/login`
/// - **Token key**: `token`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix of every request path.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Application name, sent nowhere but logged.
    pub app_name: String,
    /// Page opened when the session is rejected.
    pub login_path: String,
    /// Storage key of the session token.
    pub token_key: String,
    /// Logs the resolved configuration at startup.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            app_name: DEFAULT_APP_NAME.to_string(),
            login_path: "/pages/login/login".to_string(),
            token_key: "token".to_string(),
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Loads the configuration from the process environment.
    ///
    /// Unset variables keep their defaults. An unparsable timeout falls back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let timeout = lookup(ENV_TIMEOUT)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|millis| *millis > 0)
            .map_or(defaults.timeout, Duration::from_millis);

        Self {
            base_url: lookup(ENV_BASE_URL)
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.base_url),
            timeout,
            app_name: lookup(ENV_APP_TITLE)
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.app_name),
            debug: lookup(ENV_DEBUG).is_some_and(|value| value == "true"),
            ..defaults
        }
    }

    pub(crate) fn log_if_debug(&self) {
        if self.debug {
            info!(
                app = %self.app_name,
                base_url = %self.base_url,
                timeout = ?self.timeout,
                "client configuration"
            );
        }
    }
}
