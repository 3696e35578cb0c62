//! `sensorlink-http` is an async HTTP client for the SensorLink
//! sensor-monitoring API.
//!
//! Every call goes through one request pipeline ([`SensorLinkClient::send`])
//! that applies the same timeout, retry, error and telemetry behavior:
//! - 429, 5xx, timeouts and network failures are retried with bounded
//!   exponential backoff ([`RetryPolicy`]);
//! - other 4xx responses fail immediately;
//! - failures surface as [`SensorLinkError`] with the upstream status and
//!   parsed body preserved;
//! - lifecycle events go to a pluggable [`Telemetry`] provider.
//!
//! Resource operations live on per-resource traits ([`SensorsApi`],
//! [`ReadingsApi`], [`TasksApi`], [`AlarmsApi`], [`WebhooksApi`],
//! [`AuthApi`]) implemented by both the real client and
//! [`mock::MockClient`].

mod client;
mod decode;
mod error;
mod options;
mod params;
mod request;
mod types;

pub mod mock;
pub mod resources;
pub mod telemetry;
pub mod transport;

pub use client::{ClientBuilder, SensorLinkClient, API_KEY_HEADER};
pub use error::{ApiError, ErrorBody, SensorLinkError};
pub use options::{ClientOptions, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
pub use params::QueryParams;
pub use request::ApiRequest;
pub use resources::{AlarmsApi, AuthApi, ReadingsApi, SensorsApi, TasksApi, WebhooksApi};
pub use telemetry::{NoopTelemetry, RequestContext, RequestResult, Telemetry, TracingTelemetry};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{
    Alarm, AlarmUpdate, AuthInfo, Comparison, ListAlarms, ListSensors, NewAlarm, NewTask,
    NewWebhook, Page, Reading, ReadingsLogQuery, Sensor, SensorStatus, SensorUpdate, Task,
    TaskStatus, Webhook, WebhookTestResult,
};

pub type Result<T> = std::result::Result<T, SensorLinkError>;
