#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sensorlink_http::{
    mock::MockTransport, RequestContext, RequestResult, RetryPolicy, SensorLinkClient, Telemetry,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Start {
        operation: String,
        endpoint: String,
        route: Option<String>,
    },
    End {
        status_code: u16,
        success: bool,
        rate_limited: bool,
        retry_count: u32,
    },
    RateLimit {
        retry_after_secs: u64,
    },
    Retry {
        attempt: u32,
        reason: String,
    },
}

#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<Event>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events mutex").clone()
    }

    pub fn starts(&self) -> Vec<Event> {
        self.filter(|event| matches!(event, Event::Start { .. }))
    }

    pub fn ends(&self) -> Vec<Event> {
        self.filter(|event| matches!(event, Event::End { .. }))
    }

    pub fn retries(&self) -> Vec<Event> {
        self.filter(|event| matches!(event, Event::Retry { .. }))
    }

    pub fn rate_limits(&self) -> Vec<Event> {
        self.filter(|event| matches!(event, Event::RateLimit { .. }))
    }

    fn filter(&self, predicate: impl Fn(&Event) -> bool) -> Vec<Event> {
        self.events().into_iter().filter(|event| predicate(event)).collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().expect("events mutex").push(event);
    }
}

impl Telemetry for RecordingTelemetry {
    fn on_request_start(&self, ctx: &RequestContext) {
        self.push(Event::Start {
            operation: ctx.operation.clone(),
            endpoint: ctx.endpoint.clone(),
            route: ctx.route.clone(),
        });
    }

    fn on_request_end(&self, _ctx: &RequestContext, result: &RequestResult<'_>) {
        assert_eq!(result.success, result.error.is_none());
        self.push(Event::End {
            status_code: result.status_code,
            success: result.success,
            rate_limited: result.rate_limited,
            retry_count: result.retry_count,
        });
    }

    fn on_rate_limit(&self, _ctx: &RequestContext, retry_after_secs: u64) {
        self.push(Event::RateLimit { retry_after_secs });
    }

    fn on_retry(&self, _ctx: &RequestContext, attempt: u32, reason: &str) {
        self.push(Event::Retry {
            attempt,
            reason: reason.to_owned(),
        });
    }
}

pub struct Harness {
    pub client: SensorLinkClient,
    pub transport: Arc<MockTransport>,
    pub telemetry: Arc<RecordingTelemetry>,
}

pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 10,
        backoff_multiplier: 2.0,
    }
}

pub fn harness(transport: MockTransport, retry: RetryPolicy) -> Harness {
    harness_with_timeout(transport, retry, 1_000)
}

pub fn harness_with_timeout(transport: MockTransport, retry: RetryPolicy, timeout_ms: u64) -> Harness {
    let transport = Arc::new(transport);
    let telemetry = Arc::new(RecordingTelemetry::default());
    let client = SensorLinkClient::builder("test-key")
        .base_url("https://api.example.com/v1")
        .timeout_ms(timeout_ms)
        .retry(retry)
        .transport(transport.clone())
        .telemetry(telemetry.clone())
        .build()
        .expect("valid client");
    Harness {
        client,
        transport,
        telemetry,
    }
}
