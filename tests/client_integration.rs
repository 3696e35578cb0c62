use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use sensorlink_http::{
    ApiRequest, ErrorBody, RetryPolicy, SensorLinkClient, SensorLinkError, SensorsApi,
};
use serde_json::{json, Value as JsonValue};

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: JsonValue,
    delay: Duration,
}

impl MockResponse {
    fn json(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body,
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
struct SeenRequest {
    path_and_query: String,
    api_key: Option<String>,
    content_type: Option<String>,
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    hits: Arc<AtomicUsize>,
}

async fn api_handler(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    _body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    state
        .seen
        .lock()
        .expect("seen mutex must not be poisoned")
        .push(SeenRequest {
            path_and_query: uri
                .path_and_query()
                .map(|value| value.as_str().to_owned())
                .unwrap_or_default(),
            api_key: header("x-api-key"),
            content_type: header("content-type"),
        });

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "no mock response available"}),
            )
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    (response.status, Json(response.body))
}

struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn api_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().expect("seen mutex").clone()
    }
}

async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        seen: Arc::new(Mutex::new(Vec::new())),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .fallback(api_handler)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        seen: state.seen,
        task,
    }
}

fn client(server: &TestServer, retry: RetryPolicy, timeout_ms: u64) -> SensorLinkClient {
    SensorLinkClient::builder("live-key")
        .base_url(server.api_url())
        .timeout_ms(timeout_ms)
        .retry(retry)
        .build()
        .expect("valid client")
}

fn quick_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 2.0,
    }
}

#[tokio::test]
async fn get_sensor_sends_key_and_decodes_body() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::OK,
        json!({"id": "s-1", "serial_number": "SN-1", "name": "Walk-in cooler"}),
    )])
    .await;
    let api = client(&server, RetryPolicy::none(), 1_000);

    let sensor = api.get_sensor("s-1").await.expect("get must succeed");

    assert_eq!(sensor.serial_number, "SN-1");
    assert_eq!(sensor.name.as_deref(), Some("Walk-in cooler"));
    let seen = server.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path_and_query, "/v1/sensors/s-1");
    assert_eq!(seen[0].api_key.as_deref(), Some("live-key"));
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn retries_on_retryable_http_status() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})),
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"})),
        MockResponse::json(StatusCode::OK, json!({"organization_id": "org-1"})),
    ])
    .await;
    let api = client(&server, quick_retry(2), 1_000);

    let payload = api
        .send(ApiRequest::get("auth.verify", "auth/verify"))
        .await
        .expect("request must succeed after retries");

    assert_eq!(payload, Some(json!({"organization_id": "org-1"})));
    assert_eq!(server.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_error_is_not_retried_and_keeps_body() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::NOT_FOUND, json!({"error": "Not Found"})),
        MockResponse::json(StatusCode::OK, json!({})),
    ])
    .await;
    let api = client(&server, quick_retry(3), 1_000);

    let err = api.get_sensor("missing").await.expect_err("404 must fail");

    assert_eq!(err.status().map(|status| status.as_u16()), Some(404));
    assert_eq!(
        err.body(),
        Some(&ErrorBody::Json(json!({"error": "Not Found"})))
    );
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn request_timeout_surfaces_timeout_error() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::OK,
        json!({"id": "s-1", "serial_number": "SN-1"}),
    )
    .with_delay(Duration::from_millis(150))])
    .await;
    let api = client(&server, RetryPolicy::none(), 20);

    let err = api.get_sensor("s-1").await.expect_err("request must timeout");

    match err {
        SensorLinkError::Timeout { timeout_ms } => assert_eq!(timeout_ms, 20),
        other => panic!("expected timeout error, got {other:?}"),
    }
}

#[tokio::test]
async fn exhausted_retries_return_last_failure() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::BAD_GATEWAY, json!({"error": "first"})),
        MockResponse::json(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "last"})),
    ])
    .await;
    let api = client(&server, quick_retry(1), 1_000);

    let err = api
        .send(ApiRequest::get("sensors.list", "sensors"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status().map(|status| status.as_u16()), Some(503));
    assert_eq!(
        err.body().and_then(ErrorBody::as_json),
        Some(&json!({"error": "last"}))
    );
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}
