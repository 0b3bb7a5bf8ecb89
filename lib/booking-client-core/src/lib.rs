//! # Booking Client Core
//!
//! Client SDK for the activity booking REST backend.
//!
//! The backend answers in two shapes: a business envelope
//! `{ code, message, data, error }` judged by its own `code`, and legacy
//! payloads judged by the HTTP status. The [`ResponseInterpreter`] accepts
//! both, tears the session down on `401` and reports every other rejection
//! as a [`Failure`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use booking_client_core::{ApiClient, ClientConfig};
//! # use serde::Deserialize;
//! # #[derive(Deserialize)]
//! # struct Activity { id: u32, title: String }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder()
//!     .with_config(ClientConfig::from_env())
//!     .build()?;
//!
//! let activities: Vec<Activity> = client.get_json("/activities").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Interpreting Responses
//!
//! The interpreter works on its own, with any transport. Its collaborators
//! are injected; a [`Recorder`] captures the side effects:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use booking_client_core::{
//!     ErrorKind, Interpretation, RawResponse, Recorder, ResponseInterpreter, SideEffect,
//! };
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let recorder = Recorder::new();
//! let interpreter = ResponseInterpreter::new(
//!     Arc::new(recorder.clone()),
//!     Arc::new(recorder.clone()),
//!     Arc::new(recorder.clone()),
//! );
//!
//! // The business code wins over the HTTP status
//! let raw = RawResponse::new(StatusCode::OK, Some(json!({"code": 401})));
//! let Interpretation::Failure(failure) = interpreter.interpret(raw) else {
//!     panic!("expected a failure");
//! };
//! assert_eq!(failure.kind(), ErrorKind::Unauthorized);
//! assert_eq!(
//!     recorder.effects(),
//!     vec![
//!         SideEffect::Cleared("token".to_string()),
//!         SideEffect::Navigated("/pages/login/login".to_string()),
//!     ]
//! );
//! ```
//!
//! ## Hosts
//!
//! | collaborator          | default               | alternatives                 |
//! |-----------------------|-----------------------|------------------------------|
//! | [`Transport`]         | [`ReqwestTransport`]  | any implementation           |
//! | [`CredentialStore`]   | [`MemoryStore`]       | [`FileStore`], [`Recorder`]  |
//! | [`NavigationHost`]    | [`TracingNavigator`]  | closures, [`Recorder`]       |
//! | [`NoticeHost`]        | [`TracingNotices`]    | closures, [`Recorder`]       |
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`ApiClientError`]. Backend rejections
//! are [`ApiClientError::Rejected`] and carry the [`Failure`] with its
//! [`ErrorKind`]; the notice or redirect has already happened by then.

mod client;

pub use self::client::{
    ApiClient, ApiClientBuilder, ApiClientError, ClientConfig, CredentialStore, ENV_APP_TITLE,
    ENV_BASE_URL, ENV_DEBUG, ENV_TIMEOUT, Envelope, ErrorKind, Failure, FileStore, Interpretation,
    InterpreterSettings, MemoryStore, NETWORK_FAILURE_MESSAGE, NavigationHost, NoticeHost,
    RawResponse, Recorder, ReqwestTransport, ResponseInterpreter, ResponseShape, RetryPolicy,
    SecureString, SideEffect, StorageError, TracingNavigator, TracingNotices, Transport,
    TransportError, TransportRequest,
};
