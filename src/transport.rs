//! HTTP transport seam.
//!
//! The request pipeline never talks to `reqwest` directly; it hands an
//! [`HttpRequest`] to a [`Transport`] and gets an [`HttpResponse`] back.
//! Tests and alternative runtimes swap the transport without touching
//! retry or telemetry logic.

use std::fmt;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Method, StatusCode};

/// Boxed transport-level failure (connection refused, DNS, reset, ...).
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One concrete HTTP exchange as seen by the transport.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: String,
    /// Final header set (defaults merged with caller headers).
    pub headers: HeaderMap,
    /// Serialized request body, if any.
    pub body: Option<Vec<u8>>,
}

enum Body {
    Buffered(Vec<u8>),
    Live(reqwest::Response),
    Unreadable(String),
}

/// Response returned by a [`Transport`].
///
/// The body can be consumed exactly once; [`HttpResponse::bytes`] takes
/// `self`, so a response cannot be read twice.
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            Body::Buffered(bytes) => format!("{} bytes", bytes.len()),
            Body::Live(_) => "<streaming>".to_owned(),
            Body::Unreadable(reason) => format!("<unreadable: {reason}>"),
        };
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &body)
            .finish()
    }
}

impl HttpResponse {
    /// Creates a response with a fully buffered body.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::Buffered(body.into()),
        }
    }

    /// Creates a response whose body fails when read.
    pub fn unreadable(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::Unreadable(reason.into()),
        }
    }

    /// Wraps a live `reqwest` response; the body is streamed on first read.
    pub fn from_reqwest(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            body: Body::Live(response),
        }
    }

    /// Adds a response header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Reads the whole body, consuming the response.
    pub async fn bytes(self) -> Result<Vec<u8>, TransportError> {
        match self.body {
            Body::Buffered(bytes) => Ok(bytes),
            Body::Live(response) => Ok(response.bytes().await?.to_vec()),
            Body::Unreadable(reason) => Err(reason.into()),
        }
    }
}

/// Executes one HTTP exchange.
///
/// Implementations must not retry or apply timeouts themselves; the
/// pipeline owns both.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the response head plus unread body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured `reqwest` client (proxies, TLS roots, ...).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        Ok(HttpResponse::from_reqwest(response))
    }
}
