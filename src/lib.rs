pub mod auth;
pub mod checks;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod results;
pub mod routes;
pub mod state;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use sqlx::PgPool;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::checks::CheckReporter;
use crate::checks::http::HttpCheckReporter;
use crate::config::Config;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> (Router, SharedState) {
    let reporter: Option<Arc<dyn CheckReporter>> = config.checks.as_ref().and_then(|checks| {
        match HttpCheckReporter::new(checks) {
            Ok(reporter) => {
                tracing::info!("Check reporting enabled ({})", checks.url);
                Some(Arc::new(reporter) as Arc<dyn CheckReporter>)
            }
            Err(e) => {
                tracing::warn!("Check reporting not available: {e}");
                None
            }
        }
    });

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        reporter,
    });

    (router(state.clone()), state)
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .merge(routes::ingest_routes())
        .route("/health", axum::routing::get(health))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
