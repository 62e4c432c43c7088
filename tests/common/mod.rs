#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use results_receiver::auth::{self, INTERNAL_USERNAME};
use results_receiver::checks::{CheckError, CheckOutcome, CheckReporter, CheckRequest, CheckStatus};
use results_receiver::config::Config;
use results_receiver::state::{AppState, SharedState};

pub const INTERNAL_PASSWORD: &str = "processor-secret";

pub const FULL_SHA: &str = "abcdefabcdabcdefabcdabcdefabcdabcdefabcd";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub state: SharedState,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a raw body to the create endpoint with the given credentials.
    pub async fn create_raw(
        &self,
        credentials: Option<(&str, &str)>,
        body: impl Into<reqwest::Body>,
    ) -> (String, StatusCode) {
        let mut req = self
            .client
            .post(self.url("/api/results/create"))
            .header("content-type", "application/json")
            .body(body);
        if let Some((user, pass)) = credentials {
            req = req.basic_auth(user, Some(pass));
        }
        let resp = req.send().await.expect("create request failed");
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        (text, status)
    }

    /// Create a run as the internal uploader, return (body, status).
    pub async fn create_run(&self, data: &Value) -> (Value, StatusCode) {
        let (text, status) = self
            .create_raw(Some((INTERNAL_USERNAME, INTERNAL_PASSWORD)), data.to_string())
            .await;
        let body = serde_json::from_str(&text).unwrap_or(json!(text));
        (body, status)
    }

    pub async fn get_run(&self, id: i64) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(&format!("/api/runs/{id}")))
            .send()
            .await
            .expect("get run request failed");
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(json!(text));
        (body, status)
    }
}

/// Records every check it is asked to report.
pub struct RecordingReporter {
    pub calls: Mutex<Vec<CheckRequest>>,
    pub fail: bool,
}

impl RecordingReporter {
    pub fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail,
        })
    }

    pub fn calls(&self) -> Vec<CheckRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckReporter for RecordingReporter {
    fn id(&self) -> &str {
        "recording"
    }

    async fn complete_check_run(&self, request: &CheckRequest) -> Result<CheckOutcome, CheckError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(CheckError::from("check service unavailable"));
        }
        Ok(CheckOutcome {
            status: CheckStatus::Success,
            response: None,
        })
    }
}

pub fn test_config(database_url: String) -> Config {
    Config {
        database_url,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 16 * 1024,
        log_level: "warn".to_string(),
        internal_password: None,
        checks: None,
        worker_count: 1,
    }
}

/// Spawn a test app with a fresh temporary database and no check reporter.
/// Returns `None` when `DATABASE_URL` is not set.
pub async fn spawn_app() -> Option<TestApp> {
    spawn_app_with(None).await
}

/// Spawn a test app with a fresh temporary database. The internal uploader is
/// seeded with [`INTERNAL_PASSWORD`].
pub async fn spawn_app_with(reporter: Option<Arc<dyn CheckReporter>>) -> Option<TestApp> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    let db_name = format!("receiver_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    auth::seed_internal_uploader(&pool, INTERNAL_PASSWORD)
        .await
        .expect("Failed to seed internal uploader");

    let state: SharedState = Arc::new(AppState {
        pool: pool.clone(),
        config: test_config(test_url),
        reporter,
    });
    let app = results_receiver::router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    Some(TestApp {
        addr,
        pool,
        state,
        client: Client::new(),
        db_name,
    })
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    drop(app.state);
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
