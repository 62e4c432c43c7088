pub mod results;
pub mod runs;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new().route("/api/runs/{id}", get(runs::get))
}

pub fn ingest_routes() -> Router<SharedState> {
    Router::new().route("/api/results/create", post(results::create))
}
