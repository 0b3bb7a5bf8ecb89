use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use headers::{ContentType, HeaderMapExt};
use http::{HeaderMap, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

mod auth;
pub use self::auth::SecureString;

mod builder;
pub use self::builder::ApiClientBuilder;

mod config;
pub use self::config::{ClientConfig, ENV_APP_TITLE, ENV_BASE_URL, ENV_DEBUG, ENV_TIMEOUT};

mod error;
pub use self::error::{ApiClientError, StorageError, TransportError};

mod hosts;
pub use self::hosts::{
    CredentialStore, NavigationHost, NoticeHost, Recorder, SideEffect, TracingNavigator,
    TracingNotices,
};

mod interpreter;
pub use self::interpreter::{
    ErrorKind, Failure, Interpretation, InterpreterSettings, ResponseInterpreter,
};

mod response;
pub use self::response::{Envelope, RawResponse, ResponseShape};

mod storage;
pub use self::storage::{FileStore, MemoryStore};

mod transport;
pub use self::transport::{ReqwestTransport, RetryPolicy, Transport, TransportRequest};

/// Notice shown when the transport fails before any response arrives.
pub const NETWORK_FAILURE_MESSAGE: &str = "network request failed";

/// HTTP client for the booking backend.
///
/// Joins paths onto the base URL, injects the stored bearer token, sends
/// through the [`Transport`] and runs every response through the
/// [`ResponseInterpreter`]. Backend rejections come back as
/// [`ApiClientError::Rejected`].
///
/// # Example
///
/// ```rust,no_run
/// use booking_client_core::ApiClient;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::builder()
///     .with_base_url("http://localhost:8000/api")
///     .build()?;
///
/// let login = client.post("/auth/wx-login", &json!({"code": "wx-code"})).await?;
/// if let Some(token) = login["access_token"].as_str() {
///     client.set_token(token)?;
/// }
/// let _me = client.get("/users/me").await?;
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// The client is cheap to clone; clones share the transport and the hosts.
pub struct ApiClient<T = ReqwestTransport> {
    transport: Arc<T>,
    base_url: String,
    timeout: Duration,
    token_key: String,
    headers: HeaderMap,
    store: Arc<dyn CredentialStore>,
    notices: Arc<dyn NoticeHost>,
    interpreter: ResponseInterpreter,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            token_key: self.token_key.clone(),
            headers: self.headers.clone(),
            store: Arc::clone(&self.store),
            notices: Arc::clone(&self.notices),
            interpreter: self.interpreter.clone(),
        }
    }
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("interpreter", &self.interpreter)
            .finish_non_exhaustive()
    }
}

// Create
impl ApiClient {
    /// Returns a builder with the default reqwest transport.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }
}

// Session
impl<T> ApiClient<T> {
    /// Stores the session token sent as `Authorization: Bearer`.
    ///
    /// # Errors
    ///
    /// Fails if the credential store cannot be written.
    pub fn set_token(&self, token: impl Into<SecureString>) -> Result<(), ApiClientError> {
        self.store.set(&self.token_key, token.into())?;
        Ok(())
    }

    /// Returns the stored session token, if any.
    ///
    /// # Errors
    ///
    /// Fails if the credential store cannot be read.
    pub fn token(&self) -> Result<Option<SecureString>, ApiClientError> {
        Ok(self.store.get(&self.token_key)?)
    }

    /// Forgets the session token.
    ///
    /// # Errors
    ///
    /// Fails if the credential store cannot be written.
    pub fn clear_token(&self) -> Result<(), ApiClientError> {
        self.store.clear(&self.token_key)?;
        Ok(())
    }

    /// Returns the response interpreter.
    pub fn interpreter(&self) -> &ResponseInterpreter {
        &self.interpreter
    }

    /// Returns the base URL every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// Requests
impl<T> ApiClient<T>
where
    T: Transport,
{
    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<Value, ApiClientError> {
        self.request::<()>(Method::GET, path, None).await
    }

    /// Sends a `GET` request with `query` encoded in the URL.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get_with_query<Q>(&self, path: &str, query: &Q) -> Result<Value, ApiClientError>
    where
        Q: Serialize + ?Sized,
    {
        self.request(Method::GET, path, Some(query)).await
    }

    /// Sends a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value, ApiClientError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Sends a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<B>(&self, path: &str, body: &B) -> Result<Value, ApiClientError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// Sends a `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiClientError> {
        self.request::<()>(Method::DELETE, path, None).await
    }

    /// Sends a `GET` request and deserializes the payload.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request_json`].
    pub async fn get_json<R>(&self, path: &str) -> Result<R, ApiClientError>
    where
        R: DeserializeOwned,
    {
        self.request_json::<(), R>(Method::GET, path, None).await
    }

    /// Sends a `POST` request and deserializes the payload.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request_json`].
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request_json(Method::POST, path, Some(body)).await
    }

    /// Sends a request and deserializes the payload into `R`.
    ///
    /// # Errors
    ///
    /// Everything [`ApiClient::request`] returns, plus
    /// [`ApiClientError::JsonError`] with the JSON path of the mismatch.
    pub async fn request_json<P, R>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<R, ApiClientError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let value = self.request(method, path, payload).await?;
        serde_path_to_error::deserialize(&value).map_err(|err| ApiClientError::JsonError {
            path: err.path().to_string(),
            error: err.into_inner(),
            body: value.to_string(),
        })
    }

    /// Sends a request and returns the interpreted payload.
    ///
    /// A `GET` payload is encoded as query parameters; any other payload is
    /// sent as a JSON body.
    ///
    /// # Errors
    ///
    /// - [`ApiClientError::Rejected`] when the backend rejects the request
    /// - [`ApiClientError::Transport`] when no response arrives; a
    ///   [`NETWORK_FAILURE_MESSAGE`] notice is shown
    /// - URL, payload or credential store errors while building the request
    pub async fn request<P>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<Value, ApiClientError>
    where
        P: Serialize + ?Sized,
    {
        let request = self.build_request(method, path, payload)?;

        let raw = match self.transport.send(request).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "transport failure");
                self.notices.show(NETWORK_FAILURE_MESSAGE);
                return Err(error.into());
            }
        };

        Ok(self.interpreter.interpret(raw).into_result()?)
    }

    fn build_request<P>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<TransportRequest, ApiClientError>
    where
        P: Serialize + ?Sized,
    {
        let mut url = self.build_url(path)?;

        let body = match payload {
            Some(payload) if method == Method::GET => {
                let query = serde_urlencoded::to_string(payload)?;
                append_query(&mut url, &query);
                None
            }
            Some(payload) => Some(serde_json::to_value(payload)?),
            None => None,
        };

        let headers = self.build_headers()?;
        debug!(%method, %url, "request built");

        Ok(TransportRequest {
            method,
            url,
            headers,
            body,
            timeout: Some(self.timeout),
        })
    }

    fn build_url(&self, path: &str) -> Result<Url, ApiClientError> {
        let url = if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        Ok(Url::parse(&url)?)
    }

    fn build_headers(&self) -> Result<HeaderMap, ApiClientError> {
        let mut headers = HeaderMap::new();
        headers.typed_insert(ContentType::json());
        headers.extend(self.headers.clone());

        if let Some(token) = self.store.get(&self.token_key)? {
            if token.is_empty() {
                return Ok(headers);
            }
            match token.bearer() {
                Some(authorization) => headers.typed_insert(authorization),
                None => warn!("stored token is not a valid header value, sending without it"),
            }
        }
        Ok(headers)
    }
}

fn append_query(url: &mut Url, query: &str) {
    if query.is_empty() {
        return;
    }
    let merged = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
        _ => query.to_string(),
    };
    url.set_query(Some(&merged));
}
