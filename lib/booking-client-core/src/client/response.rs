use http::StatusCode;
use serde_json::{Map, Value};

const UNKNOWN_ERROR: &str = "unknown error";

/// A response as handed over by the transport.
///
/// `status` is `None` when the transport could not report one.
/// `body` is `None` for an empty body.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    status: Option<StatusCode>,
    body: Option<Value>,
}

impl RawResponse {
    /// Creates a response with a known status code.
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self {
            status: Some(status),
            body,
        }
    }

    /// Creates a response whose status code is unknown.
    pub fn without_status(body: Option<Value>) -> Self {
        Self { status: None, body }
    }

    /// Returns the HTTP status code, if the transport reported one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the decoded body.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Option<StatusCode>, Option<Value>) {
        (self.status, self.body)
    }
}

/// The backend's business envelope: `{ code, message, data, error }`.
///
/// A `code` that is not a JSON integer is kept as `None`, which never counts
/// as success. This includes floats such as `200.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    code: Option<i64>,
    message: Option<String>,
    data: Value,
    error: Option<String>,
}

impl Envelope {
    /// Decodes an envelope from a JSON object.
    ///
    /// Returns `None` when the object has no `code` key.
    pub fn from_object(mut object: Map<String, Value>) -> Option<Self> {
        let code = object.remove("code")?;
        Some(Self::with_code(&code, object))
    }

    fn with_code(code: &Value, mut rest: Map<String, Value>) -> Self {
        let text = |value: Option<Value>| match value {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };

        Self {
            code: code.as_i64(),
            message: text(rest.remove("message")),
            data: rest.remove("data").unwrap_or(Value::Null),
            error: text(rest.remove("error")),
        }
    }

    /// Returns the business status code.
    pub fn code(&self) -> Option<i64> {
        self.code
    }

    /// Returns the backend message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the backend error detail, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the wrapped payload.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consumes the envelope and returns the wrapped payload.
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Returns `true` when the business code is `200` or `201`.
    pub fn is_success(&self) -> bool {
        matches!(self.code, Some(200 | 201))
    }

    /// Returns the most specific error text: `message`, then `error`, then `"unknown error"`.
    pub fn error_message(&self) -> &str {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or(UNKNOWN_ERROR)
    }
}

/// The two response contracts the backend speaks.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// A JSON object carrying its own business `code`.
    Enveloped(Envelope),
    /// Any other body, judged solely by the HTTP status.
    Legacy(Option<Value>),
}

impl ResponseShape {
    /// Decodes a body, trying the envelope first.
    pub fn decode(body: Option<Value>) -> Self {
        match body {
            Some(Value::Object(mut object)) => match object.remove("code") {
                Some(code) => Self::Enveloped(Envelope::with_code(&code, object)),
                None => Self::Legacy(Some(Value::Object(object))),
            },
            other => Self::Legacy(other),
        }
    }
}

/// Extracts a string `message` field from a legacy body, if it has one.
pub(crate) fn legacy_message(body: Option<&Value>) -> Option<&str> {
    body.and_then(Value::as_object)
        .and_then(|object| object.get("message"))
        .and_then(Value::as_str)
}
