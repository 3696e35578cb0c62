use reqwest::{
    header::{HeaderMap, RETRY_AFTER},
    StatusCode,
};
use serde_json::Value;
use tokio::time::{timeout_at, Instant};

use crate::transport::{HttpResponse, TransportError};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SensorLinkError {
    /// Non-success HTTP status with the upstream body attached.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Network failure raised by the transport.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
    /// The attempt did not complete within the configured timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    /// A success response whose body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// A request body that could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// A lookup resolved to nothing (e.g. unknown serial number).
    #[error("not found: {0}")]
    NotFound(String),
    /// Invalid client construction options.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SensorLinkError {
    /// HTTP status associated with this failure, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(err) => Some(err.status()),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    /// Parsed upstream body for [`SensorLinkError::Api`] failures.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Api(err) => err.body(),
            _ => None,
        }
    }

    /// Whether the pipeline would attempt this request again.
    ///
    /// 429 and 5xx responses, timeouts and transport failures are retryable;
    /// every other failure is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(err) => is_retryable_status(err.status()),
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Decode(_) | Self::Encode(_) | Self::NotFound(_) | Self::Config(_) => false,
        }
    }

    /// Whether this is a 429 response.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Api(err) if err.status() == StatusCode::TOO_MANY_REQUESTS)
    }
}

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Best-effort decoded error body.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorBody {
    /// Body was a JSON object.
    Json(Value),
    /// Any other non-empty body, kept verbatim.
    Text(String),
}

impl ErrorBody {
    fn classify(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value @ Value::Object(_)) => Some(Self::Json(value)),
            _ => Some(Self::Text(String::from_utf8_lossy(bytes).into_owned())),
        }
    }

    /// Returns the JSON object when the body was one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the raw text when the body was not JSON.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Failure built from a non-2xx response.
///
/// The response body is read exactly once during construction, and the
/// constructor takes the response by value, so the same response can never
/// back two errors. Status and headers are kept; the body is stored parsed.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Option<ErrorBody>,
}

impl ApiError {
    /// Creates an error without a backing response.
    pub fn new(status: StatusCode, body: Option<ErrorBody>) -> Self {
        Self {
            message: failure_message(status),
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Builds an error from a response, consuming its body.
    ///
    /// Never fails: an unreadable or empty body leaves [`ApiError::body`]
    /// unset.
    pub async fn from_response(response: HttpResponse) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(bytes) => ErrorBody::classify(&bytes),
            Err(_) => None,
        };
        Self::from_parts(status, headers, body)
    }

    /// Same as [`ApiError::from_response`], but gives up on the body at
    /// `deadline`.
    pub(crate) async fn from_response_until(response: HttpResponse, deadline: Instant) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = match timeout_at(deadline, response.bytes()).await {
            Ok(Ok(bytes)) => ErrorBody::classify(&bytes),
            Ok(Err(_)) | Err(_) => None,
        };
        Self::from_parts(status, headers, body)
    }

    fn from_parts(status: StatusCode, headers: HeaderMap, body: Option<ErrorBody>) -> Self {
        Self {
            message: failure_message(status),
            status,
            headers,
            body,
        }
    }

    /// Human-readable summary.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the failed response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers of the failed response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Parsed body, if the response had a readable, non-empty one.
    pub fn body(&self) -> Option<&ErrorBody> {
        self.body.as_ref()
    }

    /// `retry-after` header in whole seconds, 0 when absent or unparseable.
    pub fn retry_after_secs(&self) -> u64 {
        retry_after_secs(&self.headers)
    }
}

pub(crate) fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

fn failure_message(status: StatusCode) -> String {
    format!("API request failed: {status}")
}
