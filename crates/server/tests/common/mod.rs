//! Common test utilities for E2E testing.
//!
//! Builds the full service in-process: SQLite stores in a temp directory,
//! a running counter actor, the fulfillment queue, and the axum router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use orderline_core::{
    create_counter, create_queue, Config, CounterStore, DeadLetterHandler, FulfillmentConfig,
    FulfillmentWorker, OrderStore, QueueConfig, SimulatedFulfillment, SqliteCounterStore,
    SqliteOrderStore,
};
use orderline_server::api::create_router;
use orderline_server::state::AppState;

/// Test fixture exposing the router over an in-process tower service.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Temporary directory holding the SQLite database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with a fast queue and zero-latency
    /// fulfillment.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = Config::default();
        config.database.path = db_path.clone();
        config.queue = QueueConfig {
            max_batch_size: 5,
            max_batch_wait_ms: 10,
            max_retries: 2,
            dead_letter_name: "orders-dlq".to_string(),
        };
        config.fulfillment = FulfillmentConfig { fulfill_delay_ms: 0 };

        let order_store: Arc<dyn OrderStore> = Arc::new(
            SqliteOrderStore::new(&db_path).expect("Failed to create order store"),
        );
        let counter_store: Arc<dyn CounterStore> = Arc::new(
            SqliteCounterStore::new(&db_path).expect("Failed to create counter store"),
        );

        let (counter_handle, counter_actor) = create_counter(
            config.counter.name.clone(),
            counter_store,
            config.counter.command_buffer,
        );
        tokio::spawn(counter_actor.run());

        let counter_registry = orderline_core::CounterRegistry::new();
        counter_registry.register(config.counter.name.clone(), counter_handle.clone());

        let action = Arc::new(SimulatedFulfillment::new(&config.fulfillment));
        let worker = FulfillmentWorker::new(Arc::clone(&order_store), action)
            .with_counter(counter_handle);

        let (producer, queue_runner, dead_letter_rx) =
            create_queue(config.queue.clone(), Arc::new(worker));
        tokio::spawn(queue_runner.run());

        let dead_letter_handler = DeadLetterHandler::new(
            dead_letter_rx,
            Arc::clone(&order_store),
            config.queue.dead_letter_name.clone(),
        );
        tokio::spawn(dead_letter_handler.run());

        let state = Arc::new(AppState::new(
            config,
            order_store,
            counter_registry,
            producer,
        ));

        Self {
            router: create_router(state),
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Poll an order until it reaches `expected_status` or the timeout
    /// elapses. Returns the final order body on success.
    pub async fn wait_for_status(
        &self,
        order_id: &str,
        expected_status: &str,
        timeout: Duration,
    ) -> Option<Value> {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(20);

        while start.elapsed() < timeout {
            let response = self.get(&format!("/api/v1/orders/{}", order_id)).await;
            if response.status == StatusCode::OK && response.body["status"] == expected_status {
                return Some(response.body);
            }
            tokio::time::sleep(poll_interval).await;
        }
        None
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
