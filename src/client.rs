use std::{
    fmt,
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::{sleep, timeout_at, Instant};
use url::Url;

use crate::{
    decode::decode_payload,
    telemetry::{NoopTelemetry, RequestContext, RequestResult, Telemetry},
    transport::{HttpRequest, ReqwestTransport, Transport},
    ApiError, ApiRequest, ClientOptions, Result, RetryPolicy, SensorLinkError,
};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Resolved, immutable client configuration.
struct Config {
    base_url: Url,
    api_key: HeaderValue,
    timeout_ms: u64,
    retry: RetryPolicy,
    telemetry: Arc<dyn Telemetry>,
    transport: Arc<dyn Transport>,
}

/// HTTP client for the SensorLink API.
///
/// Cloning is cheap; clones share the same configuration, transport and
/// telemetry provider. Resource operations live on the traits in
/// [`crate::resources`].
#[derive(Clone)]
pub struct SensorLinkClient {
    config: Arc<Config>,
}

impl fmt::Debug for SensorLinkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorLinkClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("timeout_ms", &self.config.timeout_ms)
            .field("retry", &self.config.retry)
            .finish()
    }
}

/// Collects construction options for [`SensorLinkClient`].
pub struct ClientBuilder {
    api_key: String,
    options: ClientOptions,
    telemetry: Option<Arc<dyn Telemetry>>,
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_key", &"<redacted>")
            .field("options", &self.options)
            .field("custom_telemetry", &self.telemetry.is_some())
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl ClientBuilder {
    /// Replaces all options at once.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the API root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = base_url.into();
        self
    }

    /// Overrides the per-attempt timeout.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.options.timeout_ms = timeout_ms;
        self
    }

    /// Overrides the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.options.retry = retry;
        self
    }

    /// Injects a telemetry provider. Defaults to [`NoopTelemetry`].
    pub fn telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Injects an HTTP transport. Defaults to [`ReqwestTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validates the options and freezes them into a client.
    pub fn build(self) -> Result<SensorLinkClient> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(SensorLinkError::Config("API key is required".to_owned()));
        }
        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|_| SensorLinkError::Config("API key contains invalid characters".to_owned()))?;
        api_key.set_sensitive(true);

        let base_url = normalize_base_url(&self.options.base_url)?;

        if self.options.timeout_ms == 0 {
            return Err(SensorLinkError::Config(
                "timeout_ms must be greater than zero".to_owned(),
            ));
        }
        let multiplier = self.options.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(SensorLinkError::Config(format!(
                "backoff_multiplier must be a finite number >= 1, got {multiplier}"
            )));
        }

        Ok(SensorLinkClient {
            config: Arc::new(Config {
                base_url,
                api_key,
                timeout_ms: self.options.timeout_ms,
                retry: self.options.retry,
                telemetry: self
                    .telemetry
                    .unwrap_or_else(|| Arc::new(NoopTelemetry)),
                transport: self
                    .transport
                    .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
            }),
        })
    }
}

enum Attempt {
    Success { status: u16, payload: Option<Value> },
    Failed { status: u16, error: SensorLinkError },
}

impl SensorLinkClient {
    /// Starts building a client for `api_key`.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            api_key: api_key.into(),
            options: ClientOptions::default(),
            telemetry: None,
            transport: None,
        }
    }

    /// Creates a client with default options.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `SENSORLINK_API_KEY`: required
    /// - `SENSORLINK_BASE_URL`: optional API root override
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SENSORLINK_API_KEY").map_err(|_| {
            SensorLinkError::Config("missing SENSORLINK_API_KEY environment variable".to_owned())
        })?;
        let mut builder = Self::builder(api_key);
        if let Ok(base_url) = std::env::var("SENSORLINK_BASE_URL") {
            if !base_url.trim().is_empty() {
                builder = builder.base_url(base_url);
            }
        }
        builder.build()
    }

    /// Normalized API root, always ending in `/`.
    pub fn base_url(&self) -> &str {
        self.config.base_url.as_str()
    }

    /// Active retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Runs `request` through the pipeline and decodes the payload into `T`.
    ///
    /// A `204` or empty body decodes as JSON `null`, so `T = ()` or
    /// `Option<_>` accept it.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let operation = request.operation.clone();
        let payload = self.send(request).await?;
        decode_payload(&operation, payload)
    }

    /// Runs `request` through the pipeline.
    ///
    /// Returns `None` for `204` or an empty body, the decoded JSON otherwise.
    /// 429, 5xx, timeouts and transport failures are retried with
    /// exponential backoff; other 4xx responses fail immediately. When
    /// retries run out, the last failure is returned as-is.
    pub async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        let config = &*self.config;
        let ApiRequest {
            operation,
            method,
            endpoint,
            route,
            headers,
            body,
            attributes,
        } = request;
        let ctx = RequestContext {
            operation,
            method,
            endpoint,
            route,
            started_at: SystemTime::now(),
            attributes,
        };
        let started = Instant::now();
        config.telemetry.on_request_start(&ctx);

        let url = match resolve_url(&config.base_url, &ctx.endpoint) {
            Ok(url) => url,
            Err(err) => {
                self.finish(&ctx, started, 0, false, 0, Some(&err));
                return Err(err);
            }
        };
        let headers = self.merged_headers(&headers);

        let max_retries = config.retry.max_retries;
        let mut rate_limited = false;
        let mut last_error: Option<SensorLinkError> = None;
        let mut attempt: u32 = 0;

        loop {
            if attempt > 0 {
                let delay = config.retry.delay_for_attempt(attempt);
                let reason = last_error.as_ref().map_or("unknown", retry_reason);
                config.telemetry.on_retry(&ctx, attempt, reason);
                tracing::debug!(
                    operation = %ctx.operation,
                    attempt,
                    reason,
                    delay_ms = delay.as_millis() as u64,
                    "retrying request after backoff"
                );
                sleep(delay).await;
            }

            tracing::debug!(
                operation = %ctx.operation,
                method = %ctx.method,
                url = %url,
                attempt,
                "sending request"
            );
            let request = HttpRequest {
                method: ctx.method.clone(),
                url: url.to_string(),
                headers: headers.clone(),
                body: body.clone(),
            };
            match self.attempt(request).await {
                Attempt::Success { status, payload } => {
                    self.finish(&ctx, started, status, rate_limited, attempt, None);
                    return Ok(payload);
                }
                Attempt::Failed { status, error } => {
                    if let SensorLinkError::Api(api) = &error {
                        if api.status() == StatusCode::TOO_MANY_REQUESTS {
                            rate_limited = true;
                            let retry_after_secs = api.retry_after_secs();
                            tracing::warn!(
                                operation = %ctx.operation,
                                attempt,
                                retry_after_secs,
                                "rate limited by upstream"
                            );
                            config.telemetry.on_rate_limit(&ctx, retry_after_secs);
                        }
                    }

                    if !error.is_retryable() || attempt >= max_retries {
                        if error.is_retryable() {
                            tracing::warn!(
                                operation = %ctx.operation,
                                attempts = attempt + 1,
                                error = %error,
                                "giving up after exhausting retries"
                            );
                        }
                        self.finish(&ctx, started, status, rate_limited, attempt, Some(&error));
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }
            attempt += 1;
        }
    }

    /// One HTTP exchange bounded by the configured timeout.
    async fn attempt(&self, request: HttpRequest) -> Attempt {
        let config = &*self.config;
        let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);
        let timed_out = || Attempt::Failed {
            status: 0,
            error: SensorLinkError::Timeout {
                timeout_ms: config.timeout_ms,
            },
        };

        let response = match timeout_at(deadline, config.transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                return Attempt::Failed {
                    status: 0,
                    error: SensorLinkError::Transport(err),
                }
            }
            Err(_) => return timed_out(),
        };

        let status = response.status();
        if !status.is_success() {
            let error = ApiError::from_response_until(response, deadline).await;
            return Attempt::Failed {
                status: status.as_u16(),
                error: SensorLinkError::Api(error),
            };
        }

        let success = |payload| Attempt::Success {
            status: status.as_u16(),
            payload,
        };
        if status == StatusCode::NO_CONTENT {
            return success(None);
        }

        let bytes = match timeout_at(deadline, response.bytes()).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => {
                return Attempt::Failed {
                    status: 0,
                    error: SensorLinkError::Transport(err),
                }
            }
            Err(_) => return timed_out(),
        };
        if bytes.is_empty() {
            return success(None);
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Null) => success(None),
            Ok(payload) => success(Some(payload)),
            Err(err) => Attempt::Failed {
                status: status.as_u16(),
                error: SensorLinkError::Decode(format!(
                    "invalid JSON in {status} response: {err}"
                )),
            },
        }
    }

    fn merged_headers(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(extra.len() + 2);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            self.config.api_key.clone(),
        );
        for name in extra.keys() {
            headers.remove(name);
        }
        for (name, value) in extra {
            headers.append(name.clone(), value.clone());
        }
        headers
    }

    fn finish(
        &self,
        ctx: &RequestContext,
        started: Instant,
        status_code: u16,
        rate_limited: bool,
        retry_count: u32,
        error: Option<&SensorLinkError>,
    ) {
        let result = RequestResult {
            status_code,
            success: error.is_none(),
            duration: started.elapsed(),
            rate_limited,
            retry_count,
            error,
        };
        self.config.telemetry.on_request_end(ctx, &result);
    }
}

fn retry_reason(error: &SensorLinkError) -> &'static str {
    match error {
        SensorLinkError::Api(api) if api.status() == StatusCode::TOO_MANY_REQUESTS => {
            "rate_limited"
        }
        SensorLinkError::Api(_) => "server_error",
        SensorLinkError::Timeout { .. } => "timeout",
        SensorLinkError::Transport(_) => "network_error",
        _ => "unknown",
    }
}

/// Parses `base_url` and forces exactly one trailing `/`, so relative
/// endpoints append to its path instead of replacing the last segment.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{trimmed}/"))
        .map_err(|err| SensorLinkError::Config(format!("invalid base URL '{base_url}': {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SensorLinkError::Config(format!(
            "base URL must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

fn resolve_url(base_url: &Url, endpoint: &str) -> Result<Url> {
    base_url.join(endpoint).map_err(|err| {
        SensorLinkError::Config(format!("invalid endpoint '{endpoint}': {err}"))
    })
}
