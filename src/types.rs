//! Wire types for the SensorLink API.
//!
//! Field names are snake_case on the wire. List endpoints return a
//! [`Page`] envelope: `{"results": [...], "next_cursor": ..., "total_count": ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::params::QueryParams;

/// Cursor-paginated list envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Whether another page can be requested with [`Page::next_cursor`].
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub serial_number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorStatus {
    pub sensor_id: String,
    pub online: bool,
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub signal_strength: Option<i32>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Partial sensor update; unset fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

/// Filters for `GET sensors`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSensors {
    pub serial_number: Option<String>,
    pub location_id: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

impl ListSensors {
    pub(crate) fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .push_opt("serial_number", self.serial_number.as_deref())
            .push_opt("location_id", self.location_id.as_deref())
            .push_opt("cursor", self.cursor.as_deref())
            .push_opt("limit", self.limit)
    }
}

/// One environmental sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

/// Pagination for a task's reading log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingsLogQuery {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

impl ReadingsLogQuery {
    pub(crate) fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .push_opt("cursor", self.cursor.as_deref())
            .push_opt("limit", self.limit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Server-side export of readings over a time range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub sensor_ids: Vec<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub sensor_ids: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Restricts the log to these metrics; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    Below,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub sensor_id: String,
    pub metric: String,
    pub comparison: Comparison,
    pub threshold: f64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAlarm {
    pub sensor_id: String,
    pub metric: String,
    pub comparison: Comparison,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Filters for `GET alarms`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAlarms {
    pub sensor_id: Option<String>,
    pub enabled: Option<bool>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

impl ListAlarms {
    pub(crate) fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .push_opt("sensor_id", self.sensor_id.as_deref())
            .push_opt("enabled", self.enabled)
            .push_opt("cursor", self.cursor.as_deref())
            .push_opt("limit", self.limit)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWebhook {
    pub url: String,
    pub events: Vec<String>,
    /// Shared secret used to sign deliveries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Outcome of a test delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookTestResult {
    pub delivered: bool,
    #[serde(default)]
    pub status_code: Option<u16>,
}

/// Identity behind the configured API key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub organization_id: String,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}
