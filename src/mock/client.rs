use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::SystemTime,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use super::{factories, lock};
use crate::{
    decode::decode_payload,
    resources::{AlarmsApi, AuthApi, ReadingsApi, SensorsApi, TasksApi, WebhooksApi},
    Alarm, AlarmUpdate, AuthInfo, ListAlarms, ListSensors, NewAlarm, NewTask, NewWebhook, Page,
    Reading, ReadingsLogQuery, Result, Sensor, SensorLinkError, SensorStatus, SensorUpdate, Task,
    TaskStatus, Webhook, WebhookTestResult,
};

/// What a recorded call returned.
#[derive(Clone, Debug, PartialEq)]
pub enum CallOutcome {
    /// JSON rendering of the returned value.
    Ok(Value),
    /// Display rendering of the returned error.
    Err(String),
}

/// One entry of the [`MockClient`] call log.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Operation name, same as the real client reports to telemetry.
    pub operation: String,
    /// Arguments as JSON.
    pub args: Value,
    pub timestamp: SystemTime,
    pub outcome: CallOutcome,
}

#[derive(Default)]
struct Canned {
    once: VecDeque<Result<Value>>,
    always: Option<Value>,
}

/// Recording fake implementing every resource trait.
///
/// For each operation the fake answers, in order of preference: the next
/// one-shot outcome queued with [`MockClient::respond_once`] or
/// [`MockClient::fail_once`], the persistent value set with
/// [`MockClient::respond_with`], or a factory default.
///
/// ```
/// use sensorlink_http::{mock::{factories, MockClient}, SensorsApi};
///
/// # tokio_test_block_on(async {
/// let mock = MockClient::new();
/// mock.respond_with("sensors.get", &factories::sensor("s-9", "SN-9"));
/// let sensor = mock.get_sensor("s-9").await.unwrap();
/// assert_eq!(sensor.serial_number, "SN-9");
/// assert_eq!(mock.calls_to("sensors.get").len(), 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Default)]
pub struct MockClient {
    canned: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl std::fmt::Debug for MockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClient")
            .field("calls", &lock(&self.calls).len())
            .finish()
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value returned by every call to `operation`.
    pub fn respond_with<T: Serialize + ?Sized>(&self, operation: &str, value: &T) {
        let value = to_json(value);
        lock(&self.canned)
            .entry(operation.to_owned())
            .or_default()
            .always = Some(value);
    }

    /// Queues a value for the next call to `operation` only.
    pub fn respond_once<T: Serialize + ?Sized>(&self, operation: &str, value: &T) {
        let value = to_json(value);
        lock(&self.canned)
            .entry(operation.to_owned())
            .or_default()
            .once
            .push_back(Ok(value));
    }

    /// Queues a failure for the next call to `operation` only.
    pub fn fail_once(&self, operation: &str, error: SensorLinkError) {
        lock(&self.canned)
            .entry(operation.to_owned())
            .or_default()
            .once
            .push_back(Err(error));
    }

    /// Full call log, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Calls to one operation, oldest first.
    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    /// Forgets recorded calls and canned outcomes.
    pub fn reset(&self) {
        lock(&self.calls).clear();
        lock(&self.canned).clear();
    }

    fn next_outcome(&self, operation: &str) -> Option<Result<Value>> {
        let mut canned = lock(&self.canned);
        let entry = canned.get_mut(operation)?;
        entry
            .once
            .pop_front()
            .or_else(|| entry.always.clone().map(Ok))
    }

    fn dispatch<T, D>(&self, operation: &str, args: Value, default: D) -> Result<T>
    where
        T: DeserializeOwned,
        D: FnOnce() -> Value,
    {
        let outcome = self
            .next_outcome(operation)
            .unwrap_or_else(|| Ok(default()));
        let result = outcome.and_then(|value| {
            let decoded = decode_payload::<T>(operation, Some(value.clone()))?;
            Ok((value, decoded))
        });

        let recorded = match &result {
            Ok((value, _)) => CallOutcome::Ok(value.clone()),
            Err(err) => CallOutcome::Err(err.to_string()),
        };
        lock(&self.calls).push(RecordedCall {
            operation: operation.to_owned(),
            args,
            timestamp: SystemTime::now(),
            outcome: recorded,
        });

        result.map(|(_, decoded)| decoded)
    }
}

/// Panics when `value` has no JSON form; a canned value that cannot be
/// served is a broken test setup.
fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|err| panic!("MockClient: canned value is not serializable: {err}"))
}

#[async_trait]
impl SensorsApi for MockClient {
    async fn list_sensors(&self, query: &ListSensors) -> Result<Page<Sensor>> {
        self.dispatch("sensors.list", json!({ "query": query }), || {
            to_json(&factories::page(vec![factories::sensor("sensor-1", "SN-0001")]))
        })
    }

    async fn get_sensor(&self, sensor_id: &str) -> Result<Sensor> {
        self.dispatch("sensors.get", json!({ "sensor_id": sensor_id }), || {
            to_json(&factories::sensor(sensor_id, "SN-0001"))
        })
    }

    async fn get_sensor_by_serial(&self, serial_number: &str) -> Result<Sensor> {
        self.dispatch(
            "sensors.getBySerial",
            json!({ "serial_number": serial_number }),
            || to_json(&factories::sensor("sensor-1", serial_number)),
        )
    }

    async fn get_sensor_status(&self, sensor_id: &str) -> Result<SensorStatus> {
        self.dispatch("sensors.getStatus", json!({ "sensor_id": sensor_id }), || {
            to_json(&factories::sensor_status(sensor_id))
        })
    }

    async fn update_sensor(&self, sensor_id: &str, update: &SensorUpdate) -> Result<Sensor> {
        self.dispatch(
            "sensors.update",
            json!({ "sensor_id": sensor_id, "update": update }),
            || {
                let mut sensor = factories::sensor(sensor_id, "SN-0001");
                if let Some(name) = &update.name {
                    sensor.name = Some(name.clone());
                }
                if let Some(location_id) = &update.location_id {
                    sensor.location_id = Some(location_id.clone());
                }
                to_json(&sensor)
            },
        )
    }
}

#[async_trait]
impl ReadingsApi for MockClient {
    async fn get_latest_readings(&self, sensor_ids: &[&str]) -> Result<Vec<Reading>> {
        self.dispatch(
            "readings.getLatest",
            json!({ "sensor_ids": sensor_ids }),
            || {
                let readings: Vec<Reading> =
                    sensor_ids.iter().map(|id| factories::reading(id)).collect();
                to_json(&readings)
            },
        )
    }

    async fn get_readings_log(
        &self,
        task_id: &str,
        query: &ReadingsLogQuery,
    ) -> Result<Page<Reading>> {
        self.dispatch(
            "readings.getLog",
            json!({ "task_id": task_id, "query": query }),
            || to_json(&factories::page(vec![factories::reading("sensor-1")])),
        )
    }
}

#[async_trait]
impl TasksApi for MockClient {
    async fn create_task(&self, task: &NewTask) -> Result<Task> {
        self.dispatch("tasks.create", json!({ "task": task }), || {
            let mut created = factories::task("task-1", TaskStatus::Pending);
            created.sensor_ids = task.sensor_ids.clone();
            created.start = Some(task.start);
            created.end = Some(task.end);
            to_json(&created)
        })
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.dispatch("tasks.get", json!({ "task_id": task_id }), || {
            to_json(&factories::task(task_id, TaskStatus::Completed))
        })
    }

    async fn cancel_task(&self, task_id: &str) -> Result<()> {
        self.dispatch("tasks.cancel", json!({ "task_id": task_id }), || Value::Null)
    }
}

#[async_trait]
impl AlarmsApi for MockClient {
    async fn list_alarms(&self, query: &ListAlarms) -> Result<Page<Alarm>> {
        self.dispatch("alarms.list", json!({ "query": query }), || {
            to_json(&factories::page(vec![factories::alarm("alarm-1", "sensor-1")]))
        })
    }

    async fn get_alarm(&self, alarm_id: &str) -> Result<Alarm> {
        self.dispatch("alarms.get", json!({ "alarm_id": alarm_id }), || {
            to_json(&factories::alarm(alarm_id, "sensor-1"))
        })
    }

    async fn create_alarm(&self, alarm: &NewAlarm) -> Result<Alarm> {
        self.dispatch("alarms.create", json!({ "alarm": alarm }), || {
            let mut created = factories::alarm("alarm-1", &alarm.sensor_id);
            created.metric = alarm.metric.clone();
            created.comparison = alarm.comparison;
            created.threshold = alarm.threshold;
            created.name = alarm.name.clone();
            to_json(&created)
        })
    }

    async fn update_alarm(&self, alarm_id: &str, update: &AlarmUpdate) -> Result<Alarm> {
        self.dispatch(
            "alarms.update",
            json!({ "alarm_id": alarm_id, "update": update }),
            || {
                let mut alarm = factories::alarm(alarm_id, "sensor-1");
                if let Some(comparison) = update.comparison {
                    alarm.comparison = comparison;
                }
                if let Some(threshold) = update.threshold {
                    alarm.threshold = threshold;
                }
                if let Some(enabled) = update.enabled {
                    alarm.enabled = enabled;
                }
                if update.name.is_some() {
                    alarm.name = update.name.clone();
                }
                to_json(&alarm)
            },
        )
    }

    async fn delete_alarm(&self, alarm_id: &str) -> Result<()> {
        self.dispatch("alarms.delete", json!({ "alarm_id": alarm_id }), || Value::Null)
    }
}

#[async_trait]
impl WebhooksApi for MockClient {
    async fn list_webhooks(&self) -> Result<Vec<Webhook>> {
        self.dispatch("webhooks.list", Value::Null, || {
            to_json(&vec![factories::webhook(
                "webhook-1",
                "https://hooks.example.com/sensorlink",
            )])
        })
    }

    async fn create_webhook(&self, webhook: &NewWebhook) -> Result<Webhook> {
        self.dispatch("webhooks.create", json!({ "webhook": webhook }), || {
            let mut created = factories::webhook("webhook-1", &webhook.url);
            created.events = webhook.events.clone();
            to_json(&created)
        })
    }

    async fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        self.dispatch(
            "webhooks.delete",
            json!({ "webhook_id": webhook_id }),
            || Value::Null,
        )
    }

    async fn test_webhook(&self, webhook_id: &str) -> Result<WebhookTestResult> {
        self.dispatch("webhooks.test", json!({ "webhook_id": webhook_id }), || {
            to_json(&factories::webhook_test_result())
        })
    }
}

#[async_trait]
impl AuthApi for MockClient {
    async fn verify_api_key(&self) -> Result<AuthInfo> {
        self.dispatch("auth.verify", Value::Null, || to_json(&factories::auth_info()))
    }
}
