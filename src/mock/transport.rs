use std::{collections::VecDeque, sync::Mutex, time::Duration};

use async_trait::async_trait;

use super::lock;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

enum Reply {
    Response(HttpResponse),
    Error(String),
}

struct Scripted {
    delay: Duration,
    reply: Reply,
}

type Fallback = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Scripted [`Transport`].
///
/// Replies are served in FIFO order. Once the script runs dry the fallback
/// (if any) answers; otherwise the call fails as a transport error. Every
/// request is recorded.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<Fallback>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("scripted", &lock(&self.script).len())
            .field("has_fallback", &self.fallback.is_some())
            .field("requests", &lock(&self.requests).len())
            .finish()
    }
}

impl MockTransport {
    /// Empty script, no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every request with a fresh response from `responder`.
    pub fn always<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        Self {
            fallback: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    /// Queues a response.
    pub fn with_response(self, response: HttpResponse) -> Self {
        self.push(Duration::ZERO, Reply::Response(response))
    }

    /// Queues a response delivered after `delay`.
    pub fn with_delayed_response(self, delay: Duration, response: HttpResponse) -> Self {
        self.push(delay, Reply::Response(response))
    }

    /// Queues a transport failure (connection refused, reset, ...).
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.push(Duration::ZERO, Reply::Error(message.into()))
    }

    fn push(self, delay: Duration, reply: Reply) -> Self {
        lock(&self.script).push_back(Scripted { delay, reply });
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request.clone());
        let next = lock(&self.script).pop_front();

        let Some(scripted) = next else {
            return match &self.fallback {
                Some(responder) => Ok(responder(&request)),
                None => Err("mock transport has no scripted response".into()),
            };
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        match scripted.reply {
            Reply::Response(response) => Ok(response),
            Reply::Error(message) => Err(message.into()),
        }
    }
}
