use std::fmt::Debug;

use super::interpreter::Failure;

/// Errors that can occur when using the [`ApiClient`](super::ApiClient).
///
/// Backend rejections (enveloped business errors, HTTP errors, expired
/// sessions) arrive as [`ApiClientError::Rejected`]; every other variant is a
/// local failure that happened before or after the exchange.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// The transport could not complete the exchange.
    ///
    /// Occurs on connection failures, timeouts or DNS errors. A
    /// "network request failed" notice has already been shown.
    Transport(TransportError),

    /// URL parsing error when joining the base URL and the request path.
    UrlError(url::ParseError),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// JSON serialization error for request payloads.
    JsonValueError(serde_json::Error),

    /// Query parameter serialization error.
    ///
    /// Occurs when a GET or DELETE payload cannot be flattened to a query string.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// The credential store failed while reading the session token.
    Storage(StorageError),

    /// The backend rejected the request.
    ///
    /// Carries the classified [`Failure`] produced by the response interpreter.
    Rejected(Failure),

    /// The base URL cannot carry a path.
    #[display("Invalid base URL: {url}")]
    #[from(skip)]
    InvalidBaseUrl {
        /// The rejected base URL.
        url: String,
    },

    /// JSON payload deserialization failure.
    ///
    /// Occurs when a successful payload does not match the expected type.
    #[display("Failed to deserialize JSON at '{path}': {error}\n{body}")]
    #[from(skip)]
    JsonError {
        /// The JSON path where the error occurred.
        path: String,
        /// The underlying JSON parsing error.
        error: serde_json::Error,
        /// The payload that failed to parse.
        body: String,
    },
}

impl ApiClientError {
    /// Returns the interpreter failure if the backend rejected the request.
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Rejected(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Errors raised by a [`Transport`](super::Transport) implementation.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TransportError {
    /// HTTP client error from the underlying reqwest library.
    Reqwest(reqwest::Error),

    /// Failure reported by a custom transport.
    #[display("Transport failure: {message}")]
    #[from(skip)]
    Other {
        /// Description of the failure.
        message: String,
    },
}

impl TransportError {
    /// Returns `true` for failures worth retrying: connection refused or timed out.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Reqwest(error) => error.is_connect() || error.is_timeout(),
            Self::Other { .. } => false,
        }
    }
}

/// Errors raised by a [`CredentialStore`](super::CredentialStore).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    Io(std::io::Error),

    /// A stored value is not valid JSON.
    Json(serde_json::Error),

    /// The store lock was poisoned by a panicking writer.
    #[display("Credential store unavailable: {message}")]
    #[from(skip)]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::interpreter::ErrorKind;

    #[test]
    fn test_api_client_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ApiClientError>();
        assert_sync::<ApiClientError>();
    }

    #[test]
    fn should_display_rejection_with_failure_message() {
        let error = ApiClientError::from(Failure::new("not found", ErrorKind::GenericBusinessError));

        insta::assert_snapshot!(error.to_string(), @"not found");
        assert_eq!(
            error.as_failure().map(Failure::kind),
            Some(ErrorKind::GenericBusinessError)
        );
    }

    #[test]
    fn should_not_expose_failure_for_local_errors() {
        let error = ApiClientError::InvalidBaseUrl {
            url: "mailto:someone".to_string(),
        };

        assert!(error.as_failure().is_none());
        insta::assert_snapshot!(error.to_string(), @"Invalid base URL: mailto:someone");
    }

    #[test]
    fn should_not_retry_custom_transport_failures() {
        let error = TransportError::Other {
            message: "offline".to_string(),
        };

        assert!(!error.is_transient());
    }
}
