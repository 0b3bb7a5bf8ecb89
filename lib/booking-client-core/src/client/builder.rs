use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::config::ClientConfig;
use super::hosts::{CredentialStore, NavigationHost, NoticeHost, TracingNavigator, TracingNotices};
use super::interpreter::{InterpreterSettings, ResponseInterpreter};
use super::storage::MemoryStore;
use super::transport::{ReqwestTransport, Transport};
use super::{ApiClient, ApiClientError};

/// Builder for [`ApiClient`] instances.
///
/// # Default Configuration
///
/// - **Transport**: [`ReqwestTransport`] without retries
/// - **Credential store**: an in-memory [`MemoryStore`]
/// - **Navigation and notices**: logged through `tracing`
/// - **Settings**: [`ClientConfig::default()`]
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use booking_client_core::{ApiClient, FileStore};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::builder()
///     .with_base_url("https://booking.example.com/api")
///     .with_timeout(Duration::from_secs(5))
///     .with_store(Arc::new(FileStore::new("session.json")))
///     .with_notices(Arc::new(|message: &str| eprintln!("{message}")))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClientBuilder<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn NavigationHost>,
    notices: Arc<dyn NoticeHost>,
    extra_session_keys: Vec<String>,
    headers: HeaderMap,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            transport: ReqwestTransport::new(),
            config: ClientConfig::default(),
            store: Arc::new(MemoryStore::new()),
            navigator: Arc::new(TracingNavigator),
            notices: Arc::new(TracingNotices),
            extra_session_keys: Vec::new(),
            headers: HeaderMap::new(),
        }
    }
}

impl<T> fmt::Debug for ApiClientBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientBuilder")
            .field("config", &self.config)
            .field("extra_session_keys", &self.extra_session_keys)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl<T> ApiClientBuilder<T>
where
    T: Transport,
{
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is not an absolute URL able to carry a path.
    pub fn build(self) -> Result<ApiClient<T>, ApiClientError> {
        let Self {
            transport,
            config,
            store,
            navigator,
            notices,
            extra_session_keys,
            headers,
        } = self;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(ApiClientError::InvalidBaseUrl { url: base_url });
        }
        config.log_if_debug();

        let settings = InterpreterSettings {
            token_key: config.token_key.clone(),
            extra_session_keys,
            login_path: config.login_path.clone(),
            ..InterpreterSettings::default()
        };
        let interpreter =
            ResponseInterpreter::new(Arc::clone(&store), navigator, Arc::clone(&notices))
                .with_settings(settings);

        Ok(ApiClient {
            transport: Arc::new(transport),
            base_url,
            timeout: config.timeout,
            token_key: config.token_key,
            headers,
            store,
            notices,
            interpreter,
        })
    }
}

impl<T> ApiClientBuilder<T> {
    /// Replaces the transport.
    pub fn with_transport<U>(self, transport: U) -> ApiClientBuilder<U>
    where
        U: Transport,
    {
        let Self {
            config,
            store,
            navigator,
            notices,
            extra_session_keys,
            headers,
            ..
        } = self;

        ApiClientBuilder {
            transport,
            config,
            store,
            navigator,
            notices,
            extra_session_keys,
            headers,
        }
    }

    /// Replaces every setting at once, e.g. with [`ClientConfig::from_env()`].
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the prefix of every request path, e.g. `http://localhost:8000/api`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the page opened when the session is rejected.
    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.config.login_path = login_path.into();
        self
    }

    /// Sets the storage key of the session token.
    #[must_use]
    pub fn with_token_key(mut self, token_key: impl Into<String>) -> Self {
        self.config.token_key = token_key.into();
        self
    }

    /// Clears `key` along with the token when the session is rejected.
    #[must_use]
    pub fn also_clear_on_logout(mut self, key: impl Into<String>) -> Self {
        self.extra_session_keys.push(key.into());
        self
    }

    /// Sets the credential store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets the navigation host.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn NavigationHost>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Sets the notice host.
    #[must_use]
    pub fn with_notices(mut self, notices: Arc<dyn NoticeHost>) -> Self {
        self.notices = notices;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// # Errors
    ///
    /// Fails if `value` contains characters not allowed in a header.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, ApiClientError> {
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;
    use rstest::rstest;

    use super::*;

    #[test]
    fn should_build_with_defaults() {
        let client = ApiClientBuilder::default().build().expect("client");

        assert_eq!(client.base_url, "http://localhost:8000/api");
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(client.token_key, "token");
        assert_eq!(client.interpreter.settings(), &InterpreterSettings::default());
    }

    #[test]
    fn should_trim_trailing_slash() {
        let client = ApiClientBuilder::default()
            .with_base_url("https://booking.example.com/api/")
            .build()
            .expect("client");

        assert_eq!(client.base_url, "https://booking.example.com/api");
    }

    #[test]
    fn should_forward_session_settings_to_interpreter() {
        let client = ApiClientBuilder::default()
            .with_login_path("/pages/auth/index")
            .with_token_key("access_token")
            .also_clear_on_logout("userInfo")
            .build()
            .expect("client");

        let settings = client.interpreter.settings();
        assert_eq!(settings.login_path, "/pages/auth/index");
        assert_eq!(settings.token_key, "access_token");
        assert_eq!(settings.extra_session_keys, vec!["userInfo".to_string()]);
    }

    #[rstest]
    #[case::relative("/api")]
    #[case::garbage("not a url")]
    fn should_reject_unparsable_base_url(#[case] base_url: &str) {
        let result = ApiClientBuilder::default().with_base_url(base_url).build();

        let_assert!(Err(ApiClientError::UrlError(_)) = result);
    }

    #[test]
    fn should_reject_base_url_without_path_support() {
        let result = ApiClientBuilder::default()
            .with_base_url("mailto:bookings@example.com")
            .build();

        let_assert!(Err(ApiClientError::InvalidBaseUrl { .. }) = result);
    }

    #[test]
    fn should_reject_invalid_header_value() {
        let result = ApiClientBuilder::default()
            .with_header(HeaderName::from_static("x-client"), "line\nbreak");

        let_assert!(Err(ApiClientError::InvalidHeaderValue(_)) = result);
    }
}
