//! Request lifecycle telemetry.
//!
//! Every pipeline invocation reports exactly one [`Telemetry::on_request_start`]
//! and one [`Telemetry::on_request_end`], plus one
//! [`Telemetry::on_retry`] per retry and one [`Telemetry::on_rate_limit`] per
//! 429 received. Providers are injected at client construction; the default
//! is [`NoopTelemetry`].

use std::{
    collections::BTreeMap,
    time::{Duration, SystemTime},
};

use reqwest::Method;

use crate::SensorLinkError;

/// Immutable descriptor of one logical operation.
///
/// Built once before the first attempt and passed unchanged to every
/// callback.
#[derive(Clone, Debug)]
pub struct RequestContext {
    /// Logical operation name, e.g. `"readings.getLog"`.
    pub operation: String,
    /// HTTP method.
    pub method: Method,
    /// Concrete endpoint, possibly with a query string.
    pub endpoint: String,
    /// Parameterized route, e.g. `"environmental/tasks/:taskId/log"`.
    pub route: Option<String>,
    /// Wall-clock start of the operation.
    pub started_at: SystemTime,
    /// Free-form caller attributes.
    pub attributes: BTreeMap<String, String>,
}

impl RequestContext {
    /// Low-cardinality label for aggregation: the route template when
    /// present, otherwise the endpoint path without its query string.
    pub fn route_label(&self) -> &str {
        match &self.route {
            Some(route) => route,
            None => self
                .endpoint
                .split_once('?')
                .map_or(self.endpoint.as_str(), |(path, _)| path),
        }
    }
}

/// Final outcome of one logical operation.
#[derive(Debug)]
pub struct RequestResult<'a> {
    /// Last HTTP status observed, 0 if no response was ever received.
    pub status_code: u16,
    /// Whether the operation returned a payload.
    pub success: bool,
    /// Time from start to completion, backoff included.
    pub duration: Duration,
    /// Whether any attempt received a 429.
    pub rate_limited: bool,
    /// Retries actually performed.
    pub retry_count: u32,
    /// Terminal error when `success` is false.
    pub error: Option<&'a SensorLinkError>,
}

/// Lifecycle observer for pipeline operations.
///
/// Callbacks run inline on the request task and must return quickly.
/// Every method defaults to doing nothing.
pub trait Telemetry: Send + Sync {
    /// Called once before the first attempt.
    fn on_request_start(&self, _ctx: &RequestContext) {}

    /// Called once when the operation returns or fails.
    fn on_request_end(&self, _ctx: &RequestContext, _result: &RequestResult<'_>) {}

    /// Called for every 429 with the `retry-after` hint in seconds
    /// (0 when absent or unparseable).
    fn on_rate_limit(&self, _ctx: &RequestContext, _retry_after_secs: u64) {}

    /// Called before each retry with the 1-based retry number and a short
    /// reason derived from the previous failure.
    fn on_retry(&self, _ctx: &RequestContext, _attempt: u32, _reason: &str) {}
}

/// Default provider; records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {}

/// Forwards lifecycle callbacks to `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn on_request_start(&self, ctx: &RequestContext) {
        tracing::debug!(
            operation = %ctx.operation,
            route = ctx.route_label(),
            method = %ctx.method,
            "request started"
        );
    }

    fn on_request_end(&self, ctx: &RequestContext, result: &RequestResult<'_>) {
        let duration_ms = result.duration.as_millis() as u64;
        match result.error {
            None => tracing::info!(
                operation = %ctx.operation,
                route = ctx.route_label(),
                status = result.status_code,
                duration_ms,
                retries = result.retry_count,
                rate_limited = result.rate_limited,
                "request completed"
            ),
            Some(err) => tracing::warn!(
                operation = %ctx.operation,
                route = ctx.route_label(),
                status = result.status_code,
                duration_ms,
                retries = result.retry_count,
                rate_limited = result.rate_limited,
                error = %err,
                "request failed"
            ),
        }
    }

    fn on_rate_limit(&self, ctx: &RequestContext, retry_after_secs: u64) {
        tracing::warn!(
            operation = %ctx.operation,
            route = ctx.route_label(),
            retry_after_secs,
            "rate limited"
        );
    }

    fn on_retry(&self, ctx: &RequestContext, attempt: u32, reason: &str) {
        tracing::debug!(
            operation = %ctx.operation,
            route = ctx.route_label(),
            attempt,
            reason,
            "retrying request"
        );
    }
}
