use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::hosts::{CredentialStore, NavigationHost, NoticeHost};
use super::response::{Envelope, RawResponse, ResponseShape, legacy_message};

/// Classification of a rejected response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The session is no longer valid; credentials were cleared.
    Unauthorized,
    /// An enveloped body carried a non-success business code.
    GenericBusinessError,
    /// A legacy body came with a non-200 HTTP status.
    GenericHttpError,
}

/// A rejected response with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error)]
pub struct Failure {
    message: String,
    kind: ErrorKind,
}

impl Failure {
    /// Creates a failure.
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the human-readable reason.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if the session was torn down.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of interpreting one response.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// The payload to hand to the caller.
    Success(Value),
    /// The classified rejection.
    Failure(Failure),
}

impl Interpretation {
    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<Value, Failure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }
}

/// Knobs of the session-invalidation contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterSettings {
    /// Storage key of the session token, cleared on `401`.
    pub token_key: String,
    /// Additional keys cleared on `401`, after the token.
    pub extra_session_keys: Vec<String>,
    /// Page opened on `401`.
    pub login_path: String,
    /// Message used when a rejection carries none.
    pub default_failure_message: String,
    /// Message of every [`ErrorKind::Unauthorized`] failure.
    pub unauthorized_message: String,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            token_key: "token".to_string(),
            extra_session_keys: Vec::new(),
            login_path: "/pages/login/login".to_string(),
            default_failure_message: "request failed".to_string(),
            unauthorized_message: "unauthorized, please log in again".to_string(),
        }
    }
}

/// Turns raw transport results into payloads or classified failures.
///
/// Bodies carrying a `code` key follow the business envelope contract and
/// are judged by that code, whatever the HTTP status. Any other body is
/// judged by the HTTP status alone.
///
/// | shape     | condition      | result                  | side effects          |
/// |-----------|----------------|-------------------------|-----------------------|
/// | enveloped | code 200, 201  | `Success(data)`         | none                  |
/// | enveloped | code 401       | `Unauthorized`          | clear token, go login |
/// | enveloped | other code     | `GenericBusinessError`  | notice                |
/// | legacy    | status 200     | `Success(body)`         | none                  |
/// | legacy    | status 401     | `Unauthorized`          | clear token, go login |
/// | legacy    | other / none   | `GenericHttpError`      | notice                |
///
/// Side effects are fire-and-forget: a failing credential store is logged
/// and does not change the returned [`Interpretation`].
#[derive(Clone)]
pub struct ResponseInterpreter {
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn NavigationHost>,
    notices: Arc<dyn NoticeHost>,
    settings: InterpreterSettings,
}

impl fmt::Debug for ResponseInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseInterpreter")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ResponseInterpreter {
    /// Creates an interpreter with default settings.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn NavigationHost>,
        notices: Arc<dyn NoticeHost>,
    ) -> Self {
        Self {
            store,
            navigator,
            notices,
            settings: InterpreterSettings::default(),
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: InterpreterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the active settings.
    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Interprets one response.
    pub fn interpret(&self, raw: RawResponse) -> Interpretation {
        let (status, body) = raw.into_parts();
        match ResponseShape::decode(body) {
            ResponseShape::Enveloped(envelope) => self.interpret_envelope(envelope),
            ResponseShape::Legacy(body) => self.interpret_legacy(status, body),
        }
    }

    fn interpret_envelope(&self, envelope: Envelope) -> Interpretation {
        debug!(code = ?envelope.code(), "enveloped response");
        match envelope.code() {
            Some(200 | 201) => Interpretation::Success(envelope.into_data()),
            Some(401) => self.unauthorized(),
            _ => {
                let message = envelope
                    .message()
                    .unwrap_or(self.settings.default_failure_message.as_str());
                self.reject(message, ErrorKind::GenericBusinessError)
            }
        }
    }

    fn interpret_legacy(&self, status: Option<StatusCode>, body: Option<Value>) -> Interpretation {
        debug!(?status, "legacy response");
        match status.map(|it| it.as_u16()) {
            Some(200) => Interpretation::Success(body.unwrap_or(Value::Null)),
            Some(401) => self.unauthorized(),
            _ => {
                let message = legacy_message(body.as_ref())
                    .unwrap_or(self.settings.default_failure_message.as_str());
                self.reject(message, ErrorKind::GenericHttpError)
            }
        }
    }

    fn unauthorized(&self) -> Interpretation {
        info!(login_path = %self.settings.login_path, "session rejected, clearing credentials");
        let keys = std::iter::once(&self.settings.token_key).chain(&self.settings.extra_session_keys);
        for key in keys {
            if let Err(error) = self.store.clear(key) {
                warn!(%key, %error, "failed to clear credential");
            }
        }
        self.navigator.go(&self.settings.login_path);

        Interpretation::Failure(Failure::new(
            self.settings.unauthorized_message.clone(),
            ErrorKind::Unauthorized,
        ))
    }

    fn reject(&self, message: &str, kind: ErrorKind) -> Interpretation {
        debug!(%message, ?kind, "request rejected");
        self.notices.show(message);
        Interpretation::Failure(Failure::new(message, kind))
    }
}
