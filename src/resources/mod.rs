//! Per-resource API surface.
//!
//! Each trait is implemented by [`SensorLinkClient`](crate::SensorLinkClient)
//! and by [`MockClient`](crate::mock::MockClient), so application code can
//! depend on the trait and swap in the fake under test.

mod alarms;
mod auth;
mod readings;
mod sensors;
mod tasks;
mod webhooks;

pub use alarms::AlarmsApi;
pub use auth::AuthApi;
pub use readings::ReadingsApi;
pub use sensors::SensorsApi;
pub use tasks::TasksApi;
pub use webhooks::WebhooksApi;
