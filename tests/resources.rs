mod support;

use reqwest::{Method, StatusCode};
use sensorlink_http::{
    mock::{factories, MockTransport},
    AlarmUpdate, AlarmsApi, AuthApi, Comparison, ListAlarms, ListSensors, NewAlarm, NewTask,
    NewWebhook, ReadingsApi, ReadingsLogQuery, RetryPolicy, SensorLinkError, SensorUpdate,
    SensorsApi, TaskStatus, TasksApi, WebhooksApi,
};
use serde_json::{json, Value};

use support::{harness, Event, Harness};

fn serve(body: Value) -> Harness {
    harness(
        MockTransport::new().with_response(factories::ok_json(&body)),
        RetryPolicy::none(),
    )
}

fn only_request(h: &Harness) -> (Method, String, Option<Value>) {
    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    let body = request
        .body
        .as_ref()
        .map(|bytes| serde_json::from_slice(bytes).expect("request body is JSON"));
    (request.method.clone(), request.url.clone(), body)
}

fn started(h: &Harness) -> (String, Option<String>) {
    match h.telemetry.starts().as_slice() {
        [Event::Start {
            operation, route, ..
        }] => (operation.clone(), route.clone()),
        other => panic!("expected one start event, got {other:?}"),
    }
}

fn sensor_json(id: &str, serial: &str) -> Value {
    serde_json::to_value(factories::sensor(id, serial)).expect("sensor serializes")
}

#[tokio::test]
async fn list_sensors_applies_filters() {
    let h = serve(json!({"results": [sensor_json("s-1", "SN-1")], "next_cursor": "c2"}));

    let page = h
        .client
        .list_sensors(&ListSensors {
            location_id: Some("loc 1".to_owned()),
            limit: Some(25),
            ..ListSensors::default()
        })
        .await
        .expect("list must succeed");

    assert_eq!(page.results.len(), 1);
    assert!(page.has_more());
    let (method, url, _) = only_request(&h);
    assert_eq!(method, Method::GET);
    assert_eq!(url, "https://api.example.com/v1/sensors?location_id=loc+1&limit=25");
    assert_eq!(started(&h), ("sensors.list".to_owned(), Some("sensors".to_owned())));
}

#[tokio::test]
async fn get_sensor_escapes_id_and_uses_route_template() {
    let h = serve(sensor_json("a/b", "SN-1"));

    let sensor = h.client.get_sensor("a/b").await.expect("get must succeed");

    assert_eq!(sensor.id, "a/b");
    let (_, url, _) = only_request(&h);
    assert_eq!(url, "https://api.example.com/v1/sensors/a%2Fb");
    assert_eq!(
        started(&h),
        ("sensors.get".to_owned(), Some("sensors/:id".to_owned()))
    );
}

#[tokio::test]
async fn sensor_by_serial_picks_first_match() {
    let h = serve(json!({
        "results": [sensor_json("s-1", "SN-9"), sensor_json("s-2", "SN-9")]
    }));

    let sensor = h
        .client
        .get_sensor_by_serial("SN-9")
        .await
        .expect("lookup must succeed");

    assert_eq!(sensor.id, "s-1");
    let (_, url, _) = only_request(&h);
    assert_eq!(url, "https://api.example.com/v1/sensors?serial_number=SN-9");
    assert_eq!(started(&h).0, "sensors.getBySerial");
}

#[tokio::test]
async fn sensor_by_serial_without_match_is_not_found() {
    let h = serve(json!({"results": []}));

    let err = h
        .client
        .get_sensor_by_serial("SN-404")
        .await
        .expect_err("empty lookup must fail");

    assert!(matches!(err, SensorLinkError::NotFound(_)));
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn sensor_status_and_update() {
    let h = harness(
        MockTransport::new()
            .with_response(factories::ok_json(
                &serde_json::to_value(factories::sensor_status("s-1")).expect("serializes"),
            ))
            .with_response(factories::ok_json(&sensor_json("s-1", "SN-1"))),
        RetryPolicy::none(),
    );

    let status = h.client.get_sensor_status("s-1").await.expect("status");
    assert!(status.online);
    h.client
        .update_sensor(
            "s-1",
            &SensorUpdate {
                name: Some("Freezer".to_owned()),
                ..SensorUpdate::default()
            },
        )
        .await
        .expect("update");

    let requests = h.transport.requests();
    assert_eq!(requests[0].url, "https://api.example.com/v1/sensors/s-1/status");
    assert_eq!(requests[1].method, Method::PATCH);
    assert_eq!(
        serde_json::from_slice::<Value>(requests[1].body.as_deref().expect("body"))
            .expect("json"),
        json!({"name": "Freezer"})
    );
}

#[tokio::test]
async fn readings_log_uses_parameterized_task_route() {
    let h = serve(json!({
        "results": [{"sensor_id": "s-1", "timestamp": "2026-01-01T00:00:00Z", "temperature": 4.5}],
        "next_cursor": null,
        "total_count": 1
    }));

    let page = h
        .client
        .get_readings_log(
            "task-77",
            &ReadingsLogQuery {
                cursor: Some("abc".to_owned()),
                limit: None,
            },
        )
        .await
        .expect("log must succeed");

    assert_eq!(page.results[0].temperature, Some(4.5));
    assert_eq!(page.total_count, Some(1));
    let (_, url, _) = only_request(&h);
    assert_eq!(
        url,
        "https://api.example.com/v1/environmental/tasks/task-77/log?cursor=abc"
    );
    assert_eq!(
        started(&h),
        (
            "readings.getLog".to_owned(),
            Some("environmental/tasks/:taskId/log".to_owned())
        )
    );
}

#[tokio::test]
async fn latest_readings_join_sensor_ids() {
    let h = serve(json!({"results": [
        {"sensor_id": "s-1", "timestamp": "2026-01-01T00:00:00Z"},
        {"sensor_id": "s-2", "timestamp": "2026-01-01T00:00:00Z"}
    ]}));

    let readings = h
        .client
        .get_latest_readings(&["s-1", "s-2"])
        .await
        .expect("latest must succeed");

    assert_eq!(readings.len(), 2);
    let (_, url, _) = only_request(&h);
    assert_eq!(
        url,
        "https://api.example.com/v1/environmental/readings/latest?sensor_ids=s-1%2Cs-2"
    );
}

#[tokio::test]
async fn task_lifecycle_requests() {
    let h = harness(
        MockTransport::new()
            .with_response(factories::ok_json(&json!({"id": "t-1", "status": "pending"})))
            .with_response(factories::ok_json(&json!({"id": "t-1", "status": "completed"})))
            .with_response(factories::no_content()),
        RetryPolicy::none(),
    );

    let task = NewTask {
        sensor_ids: vec!["s-1".to_owned()],
        start: factories::fixed_time(),
        end: factories::fixed_time(),
        metrics: Vec::new(),
    };
    let created = h.client.create_task(&task).await.expect("create");
    let polled = h.client.get_task(&created.id).await.expect("get");
    h.client.cancel_task(&created.id).await.expect("cancel");

    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(polled.status, TaskStatus::Completed);
    let requests = h.transport.requests();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].url, "https://api.example.com/v1/environmental/tasks");
    let body: Value =
        serde_json::from_slice(requests[0].body.as_deref().expect("body")).expect("json");
    assert_eq!(body["sensor_ids"], json!(["s-1"]));
    assert!(body.get("metrics").is_none());
    assert_eq!(requests[2].method, Method::DELETE);
    assert_eq!(requests[2].url, "https://api.example.com/v1/environmental/tasks/t-1");
}

#[tokio::test]
async fn alarm_crud_requests() {
    let alarm = serde_json::to_value(factories::alarm("a-1", "s-1")).expect("serializes");
    let h = harness(
        MockTransport::new()
            .with_response(factories::ok_json(&json!({"results": [alarm.clone()]})))
            .with_response(factories::ok_json(&alarm))
            .with_response(factories::ok_json(&alarm))
            .with_response(factories::ok_json(&alarm))
            .with_response(factories::ok_json(&json!({"deleted": true}))),
        RetryPolicy::none(),
    );

    let listed = h
        .client
        .list_alarms(&ListAlarms {
            sensor_id: Some("s-1".to_owned()),
            enabled: Some(true),
            ..ListAlarms::default()
        })
        .await
        .expect("list");
    h.client.get_alarm("a-1").await.expect("get");
    h.client
        .create_alarm(&NewAlarm {
            sensor_id: "s-1".to_owned(),
            metric: "temperature".to_owned(),
            comparison: Comparison::Above,
            threshold: 30.0,
            name: None,
        })
        .await
        .expect("create");
    h.client
        .update_alarm(
            "a-1",
            &AlarmUpdate {
                enabled: Some(false),
                ..AlarmUpdate::default()
            },
        )
        .await
        .expect("update");
    h.client.delete_alarm("a-1").await.expect("delete tolerates a body");

    assert_eq!(listed.results.len(), 1);
    let requests = h.transport.requests();
    let summary: Vec<(Method, &str)> = requests
        .iter()
        .map(|request| (request.method.clone(), request.url.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                Method::GET,
                "https://api.example.com/v1/alarms?sensor_id=s-1&enabled=true"
            ),
            (Method::GET, "https://api.example.com/v1/alarms/a-1"),
            (Method::POST, "https://api.example.com/v1/alarms"),
            (Method::PATCH, "https://api.example.com/v1/alarms/a-1"),
            (Method::DELETE, "https://api.example.com/v1/alarms/a-1"),
        ]
    );
}

#[tokio::test]
async fn webhook_requests() {
    let webhook = serde_json::to_value(factories::webhook("w-1", "https://hooks.example.com"))
        .expect("serializes");
    let h = harness(
        MockTransport::new()
            .with_response(factories::ok_json(&json!({"results": [webhook.clone()]})))
            .with_response(factories::ok_json(&webhook))
            .with_response(factories::ok_json(&json!({"delivered": true, "status_code": 200})))
            .with_response(factories::no_content()),
        RetryPolicy::none(),
    );

    let hooks = h.client.list_webhooks().await.expect("list");
    h.client
        .create_webhook(&NewWebhook {
            url: "https://hooks.example.com".to_owned(),
            events: vec!["alarm.triggered".to_owned()],
            secret: Some("s3cret".to_owned()),
        })
        .await
        .expect("create");
    let result = h.client.test_webhook("w-1").await.expect("test");
    h.client.delete_webhook("w-1").await.expect("delete");

    assert_eq!(hooks.len(), 1);
    assert!(result.delivered);
    let requests = h.transport.requests();
    assert_eq!(requests[2].url, "https://api.example.com/v1/webhooks/w-1/test");
    assert_eq!(requests[3].method, Method::DELETE);
}

#[tokio::test]
async fn verify_api_key_reads_identity() {
    let h = serve(json!({"organization_id": "org-1", "scopes": ["read"]}));

    let info = h.client.verify_api_key().await.expect("verify");

    assert_eq!(info.organization_id, "org-1");
    assert_eq!(started(&h), ("auth.verify".to_owned(), Some("auth/verify".to_owned())));
}

#[tokio::test]
async fn dot_segment_ids_never_reach_the_transport() {
    let h = harness(
        MockTransport::always(|_| factories::ok_json(&json!({}))),
        RetryPolicy::none(),
    );

    let errors = vec![
        h.client.get_sensor("..").await.expect_err("get"),
        h.client.get_sensor_status("..").await.expect_err("status"),
        h.client
            .update_sensor(".", &SensorUpdate::default())
            .await
            .expect_err("update"),
        h.client.delete_alarm("..").await.expect_err("delete alarm"),
        h.client.cancel_task("").await.expect_err("cancel"),
        h.client.test_webhook("..").await.expect_err("test webhook"),
        h.client
            .get_readings_log("..", &ReadingsLogQuery::default())
            .await
            .expect_err("log"),
    ];

    for err in errors {
        assert!(matches!(err, SensorLinkError::Config(_)), "{err:?}");
    }
    assert_eq!(h.transport.request_count(), 0);
}
