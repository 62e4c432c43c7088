use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;

use results_receiver::checks::http::HttpCheckReporter;
use results_receiver::checks::{CheckReporter, CheckRequest, CheckStatus};
use results_receiver::config::ChecksConfig;

#[derive(Clone, Default)]
struct Received {
    requests: Arc<Mutex<Vec<(Option<String>, CheckRequest)>>>,
}

/// Start a stub check service that answers with `status` and records what it receives.
async fn spawn_stub(status: StatusCode) -> (SocketAddr, Received) {
    let received = Received::default();

    let app = axum::Router::new()
        .route(
            "/checks/complete",
            post(
                move |State(received): State<Received>,
                      headers: HeaderMap,
                      Json(request): Json<CheckRequest>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(|v| v.to_string());
                    received.requests.lock().unwrap().push((auth, request));
                    (status, "stub says hi")
                },
            ),
        )
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, received)
}

fn request() -> CheckRequest {
    CheckRequest {
        head_sha: "abcdefabcdabcdefabcdabcdefabcdabcdefabcd".to_string(),
        browser_name: "chrome".to_string(),
        run_id: 7,
    }
}

#[tokio::test]
async fn reports_success_on_2xx() {
    let (addr, received) = spawn_stub(StatusCode::OK).await;
    let reporter = HttpCheckReporter::new(&ChecksConfig {
        url: format!("http://{addr}/checks/complete"),
        token: Some("check-token".to_string()),
    })
    .unwrap();

    let outcome = reporter.complete_check_run(&request()).await.unwrap();
    assert_eq!(outcome.status, CheckStatus::Success);
    assert_eq!(outcome.response.unwrap()["status_code"], 200);

    let requests = received.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("Bearer check-token"));
    assert_eq!(requests[0].1, request());
}

#[tokio::test]
async fn reports_failure_on_error_status() {
    let (addr, received) = spawn_stub(StatusCode::SERVICE_UNAVAILABLE).await;
    let reporter = HttpCheckReporter::new(&ChecksConfig {
        url: format!("http://{addr}/checks/complete"),
        token: None,
    })
    .unwrap();

    let outcome = reporter.complete_check_run(&request()).await.unwrap();
    assert_eq!(outcome.status, CheckStatus::Failed);
    let response = outcome.response.unwrap();
    assert_eq!(response["status_code"], 503);
    assert_eq!(response["body"], "stub says hi");

    let requests = received.requests.lock().unwrap().clone();
    assert_eq!(requests[0].0, None);
}

#[tokio::test]
async fn unreachable_service_is_an_error() {
    // Bind then drop to find a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reporter = HttpCheckReporter::new(&ChecksConfig {
        url: format!("http://{addr}/checks/complete"),
        token: None,
    })
    .unwrap();

    let err = reporter.complete_check_run(&request()).await.unwrap_err();
    assert!(err.message.starts_with("Check report request failed"), "got {err}");
}
