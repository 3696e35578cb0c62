//! Canned values for tests.
//!
//! Domain factories return typed values with plausible defaults; tweak the
//! returned struct with field assignment when a test needs something
//! specific. HTTP factories return [`HttpResponse`]s for [`super::MockTransport`].

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::{
    transport::HttpResponse, Alarm, AuthInfo, Comparison, Page, Reading, Sensor, SensorStatus,
    Task, TaskStatus, Webhook, WebhookTestResult,
};

/// Fixed instant used by every factory: 2026-01-01T00:00:00Z.
pub fn fixed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).unwrap_or_default()
}

pub fn sensor(id: &str, serial_number: &str) -> Sensor {
    Sensor {
        id: id.to_owned(),
        serial_number: serial_number.to_owned(),
        name: Some(format!("Sensor {serial_number}")),
        model: Some("HT-200".to_owned()),
        location_id: None,
        created_at: Some(fixed_time()),
    }
}

pub fn sensor_status(sensor_id: &str) -> SensorStatus {
    SensorStatus {
        sensor_id: sensor_id.to_owned(),
        online: true,
        battery_level: Some(0.87),
        signal_strength: Some(-61),
        last_seen: Some(fixed_time()),
    }
}

pub fn reading(sensor_id: &str) -> Reading {
    Reading {
        sensor_id: sensor_id.to_owned(),
        timestamp: fixed_time(),
        temperature: Some(21.5),
        humidity: Some(44.0),
        co2: Some(612.0),
        pressure: Some(1013.2),
    }
}

pub fn task(id: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_owned(),
        status,
        sensor_ids: Vec::new(),
        start: None,
        end: None,
        created_at: Some(fixed_time()),
    }
}

pub fn alarm(id: &str, sensor_id: &str) -> Alarm {
    Alarm {
        id: id.to_owned(),
        sensor_id: sensor_id.to_owned(),
        metric: "temperature".to_owned(),
        comparison: Comparison::Above,
        threshold: 30.0,
        enabled: true,
        name: None,
        created_at: Some(fixed_time()),
    }
}

pub fn webhook(id: &str, url: &str) -> Webhook {
    Webhook {
        id: id.to_owned(),
        url: url.to_owned(),
        events: vec!["alarm.triggered".to_owned()],
        enabled: true,
        created_at: Some(fixed_time()),
    }
}

pub fn webhook_test_result() -> WebhookTestResult {
    WebhookTestResult {
        delivered: true,
        status_code: Some(200),
    }
}

pub fn auth_info() -> AuthInfo {
    AuthInfo {
        organization_id: "org-test".to_owned(),
        key_name: Some("test key".to_owned()),
        scopes: vec!["read".to_owned(), "write".to_owned()],
        expires_at: None,
    }
}

/// Single-page envelope around `results`.
pub fn page<T>(results: Vec<T>) -> Page<T> {
    let total = results.len() as u64;
    Page {
        results,
        next_cursor: None,
        total_count: Some(total),
    }
}

/// Response with a JSON body.
pub fn json_response(status: StatusCode, body: &Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string()).with_header("content-type", "application/json")
}

/// `200 OK` with a JSON body.
pub fn ok_json(body: &Value) -> HttpResponse {
    json_response(StatusCode::OK, body)
}

/// `204 No Content`.
pub fn no_content() -> HttpResponse {
    HttpResponse::new(StatusCode::NO_CONTENT, Vec::<u8>::new())
}

/// Response with a plain-text body.
pub fn text_response(status: StatusCode, text: &str) -> HttpResponse {
    HttpResponse::new(status, text).with_header("content-type", "text/plain")
}

/// `429 Too Many Requests`, with `retry-after` when given.
pub fn rate_limited(retry_after_secs: Option<u64>) -> HttpResponse {
    let response = json_response(
        StatusCode::TOO_MANY_REQUESTS,
        &json!({"error": "rate limit exceeded", "retry_after": retry_after_secs}),
    );
    match retry_after_secs {
        Some(secs) => response.with_header("retry-after", &secs.to_string()),
        None => response,
    }
}

/// Server error with a JSON body.
pub fn server_error(status: StatusCode) -> HttpResponse {
    json_response(status, &json!({"error": "internal error"}))
}

/// `404 Not Found` with a JSON body.
pub fn not_found() -> HttpResponse {
    json_response(StatusCode::NOT_FOUND, &json!({"error": "Not Found"}))
}
