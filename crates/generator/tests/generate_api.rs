//! Generator endpoints against a stub backend bound to an ephemeral port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Json;
use generator::{GeneratorConfig, GeneratorState, build_router};
use http_body_util::BodyExt;
use seedline::{BatchResult, CandidateRecord, CustomerSummary, Gender, RetryConfig, TransactionDraft};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

type Responder = dyn Fn(usize, usize) -> BatchResult + Send + Sync;

/// Records the size of every batch it receives and answers through
/// `respond(call_index, batch_size)`. Customer calls wait `delay` first;
/// transaction calls past `transaction_cutoff` get a `503`.
struct Stub {
    customer_batches: Mutex<Vec<usize>>,
    transaction_batches: Mutex<Vec<usize>>,
    pool: Vec<Uuid>,
    respond: Box<Responder>,
    delay: Duration,
    transaction_cutoff: Option<usize>,
}

impl Stub {
    fn build(pool: usize, respond: impl Fn(usize, usize) -> BatchResult + Send + Sync + 'static) -> Self {
        Self {
            customer_batches: Mutex::new(Vec::new()),
            transaction_batches: Mutex::new(Vec::new()),
            pool: (0..pool).map(|_| Uuid::new_v4()).collect(),
            respond: Box::new(respond),
            delay: Duration::ZERO,
            transaction_cutoff: None,
        }
    }

    fn new(pool: usize, respond: impl Fn(usize, usize) -> BatchResult + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self::build(pool, respond))
    }
}

async fn stub_customers(
    State(stub): State<Arc<Stub>>,
    Json(batch): Json<Vec<CandidateRecord>>,
) -> (StatusCode, Json<BatchResult>) {
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    let mut calls = stub.customer_batches.lock().unwrap();
    let result = (stub.respond)(calls.len(), batch.len());
    calls.push(batch.len());
    (StatusCode::CREATED, Json(result))
}

async fn stub_limit(State(stub): State<Arc<Stub>>, Path(num): Path<usize>) -> Json<Vec<CustomerSummary>> {
    Json(
        stub.pool
            .iter()
            .take(num)
            .map(|&id| CustomerSummary {
                id,
                name: "stub".into(),
                email: format!("{id}@stub.test"),
                gender: Gender::Other,
            })
            .collect(),
    )
}

async fn stub_transactions(
    State(stub): State<Arc<Stub>>,
    Json(drafts): Json<Vec<TransactionDraft>>,
) -> (StatusCode, Json<BatchResult>) {
    assert!(drafts.iter().all(|d| stub.pool.contains(&d.customer_id)));
    let mut calls = stub.transaction_batches.lock().unwrap();
    if stub.transaction_cutoff.is_some_and(|cutoff| calls.len() >= cutoff) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(BatchResult::default()));
    }
    calls.push(drafts.len());
    (StatusCode::CREATED, Json(BatchResult::new(drafts.len(), 0)))
}

async fn spawn_backend(stub: Arc<Stub>) -> String {
    let router = Router::new()
        .route("/customers/multi", post(stub_customers))
        .route("/customers/limit/{num}", get(stub_limit))
        .route("/transactions/multi", post(stub_transactions))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/")
}

fn generator(backend: String, stagnation_limit: u32) -> Router {
    generator_with_timeout(backend, stagnation_limit, 10)
}

fn generator_with_timeout(backend: String, stagnation_limit: u32, timeout_secs: u64) -> Router {
    let config = GeneratorConfig {
        backend_endpoint: backend,
        request_timeout_secs: timeout_secs,
        transaction_batch_size: 4,
        max_transactions: 50,
        retry: RetryConfig::default().with_stagnation_limit(stagnation_limit),
        ..GeneratorConfig::default()
    };
    build_router(Arc::new(GeneratorState::new(config).unwrap()))
}

async fn trigger(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::post(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn clean_run_takes_one_attempt() {
    let stub = Stub::new(0, |_, n| BatchResult::new(n, 0));
    let app = generator(spawn_backend(stub.clone()).await, 5);

    let (status, body) = trigger(&app, "/generate/customer?num=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attempts"], 1);
    assert!(body["generation_time"].is_string());
    assert!(body["send_time"].is_string());
    assert_eq!(*stub.customer_batches.lock().unwrap(), vec![7]);
}

#[tokio::test]
async fn only_failures_are_regenerated() {
    // 10 -> 4 fail -> 1 fail -> done
    let stub = Stub::new(0, |call, n| match call {
        0 => BatchResult::new(n - 4, 4),
        1 => BatchResult::new(n - 1, 1),
        _ => BatchResult::new(n, 0),
    });
    let app = generator(spawn_backend(stub.clone()).await, 5);

    let (status, body) = trigger(&app, "/generate/customer?num=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attempts"], 3);
    assert_eq!(*stub.customer_batches.lock().unwrap(), vec![10, 4, 1]);
}

#[tokio::test]
async fn stagnation_stops_after_limit() {
    let stub = Stub::new(0, |_, n| BatchResult::new(0, n));
    let app = generator(spawn_backend(stub.clone()).await, 3);

    let (status, body) = trigger(&app, "/generate/customer?num=6").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "PERSISTENT_FAILURE");
    assert_eq!(body["failed"], 6);
    assert_eq!(body["attempts"], 3);
    assert_eq!(*stub.customer_batches.lock().unwrap(), vec![6, 6, 6]);
}

#[tokio::test]
async fn invalid_count_is_rejected_before_generation() {
    let stub = Stub::new(0, |_, n| BatchResult::new(n, 0));
    let app = generator(spawn_backend(stub.clone()).await, 5);

    for uri in [
        "/generate/customer",
        "/generate/customer?num=0",
        "/generate/customer?num=-1",
        "/generate/customer?num=abc",
    ] {
        let (status, body) = trigger(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
    assert!(stub.customer_batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_a_gateway_error() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = generator(format!("http://{addr}"), 5);
    let (status, body) = trigger(&app, "/generate/customer?num=3").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "BACKEND_UNAVAILABLE");
}

#[tokio::test]
async fn transactions_are_sent_in_batches() {
    let stub = Stub::new(3, |_, n| BatchResult::new(n, 0));
    let app = generator(spawn_backend(stub.clone()).await, 5);

    let (status, body) = trigger(
        &app,
        "/generate/transactions?transactions_num=10&customers_num=2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successCount"], 10);
    assert_eq!(body["failCount"], 0);
    assert_eq!(*stub.transaction_batches.lock().unwrap(), vec![4, 4, 2]);
}

#[tokio::test]
async fn transaction_limits_and_empty_pool() {
    let stub = Stub::new(0, |_, n| BatchResult::new(n, 0));
    let app = generator(spawn_backend(stub.clone()).await, 5);

    let (status, _) = trigger(
        &app,
        "/generate/transactions?transactions_num=51&customers_num=2",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = trigger(&app, "/generate/transactions?transactions_num=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = trigger(
        &app,
        "/generate/transactions?transactions_num=5&customers_num=2",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "EMPTY_CUSTOMER_POOL");
    assert!(stub.transaction_batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn customer_count_above_the_cap_is_rejected() {
    let stub = Stub::new(0, |_, n| BatchResult::new(n, 0));
    let app = generator(spawn_backend(stub.clone()).await, 5);

    let (status, body) = trigger(&app, "/generate/customer?num=2001").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = trigger(&app, &format!("/generate/customer?num={}", usize::MAX)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(stub.customer_batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_transaction_chunk_reports_accepted_counts() {
    let stub = Arc::new(Stub {
        transaction_cutoff: Some(2),
        ..Stub::build(3, |_, n| BatchResult::new(n, 0))
    });
    let app = generator(spawn_backend(stub.clone()).await, 5);

    let (status, body) = trigger(
        &app,
        "/generate/transactions?transactions_num=10&customers_num=3",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "BACKEND_UNAVAILABLE");
    assert_eq!(body["successCount"], 8);
    assert_eq!(body["failCount"], 0);
    assert_eq!(*stub.transaction_batches.lock().unwrap(), vec![4, 4]);
}

#[tokio::test]
async fn slow_backend_times_out_as_gateway_timeout() {
    // every round fails and takes 600ms; five rounds overrun the 1s budget
    let stub = Arc::new(Stub {
        delay: Duration::from_millis(600),
        ..Stub::build(0, |_, n| BatchResult::new(0, n))
    });
    let app = generator_with_timeout(spawn_backend(stub.clone()).await, 5, 1);

    let (status, _) = trigger(&app, "/generate/customer?num=3").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(stub.customer_batches.lock().unwrap().len() < 5);
}
