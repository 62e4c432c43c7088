use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use sqlx::{Connection, PgConnection};

use crate::auth::InternalUploader;
use crate::db;
use crate::error::AppError;
use crate::models::TestRun;
use crate::results::{normalize, parser};
use crate::state::SharedState;

/// Create a test run from an uploader's JSON submission.
///
/// Steps run strictly in order and the first failure ends the request:
/// authenticate, read the body, parse, default timestamps, validate the
/// revision, store, queue the check notification, echo the stored run. The
/// run and its queued notification commit together.
pub async fn create(
    State(state): State<SharedState>,
    uploader: InternalUploader,
    body: Body,
) -> Result<Response, AppError> {
    let bytes = axum::body::to_bytes(body, state.config.max_body_size)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let submission = parser::parse_body(&bytes).map_err(AppError::BadRequest)?;

    let new_run = normalize::normalize(submission, Utc::now()).map_err(AppError::BadRequest)?;

    let internal = |e: sqlx::Error| AppError::Internal(e.to_string());

    let mut tx = state.pool.begin().await.map_err(internal)?;
    let run = db::test_runs::create(&mut *tx, &new_run).await.map_err(internal)?;

    notify_check_complete(&state, &mut tx, &run).await;
    tx.commit().await.map_err(internal)?;

    tracing::info!(
        run_id = run.id,
        revision = %run.revision,
        browser_name = %run.browser_name,
        uploader = %uploader.username,
        "Test run created"
    );

    let json = serde_json::to_vec(&run).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        [(header::CONTENT_TYPE, "application/json")],
        json,
    )
        .into_response())
}

/// Queue the check-run completion for delivery by the worker pool. The
/// outcome never affects the response.
async fn notify_check_complete(state: &SharedState, conn: &mut PgConnection, run: &TestRun) {
    if state.reporter.is_none() {
        tracing::debug!("No check reporter configured, skipping notification for run {}", run.id);
        return;
    }

    if let Err(e) = enqueue_in_savepoint(conn, run).await {
        tracing::error!("Failed to enqueue check notification for run {}: {e}", run.id);
    }
}

/// An enqueue error only rolls back to the savepoint, leaving the run insert intact.
async fn enqueue_in_savepoint(conn: &mut PgConnection, run: &TestRun) -> Result<(), sqlx::Error> {
    let mut savepoint = conn.begin().await?;
    db::check_queue::enqueue(
        &mut *savepoint,
        run.id,
        &run.full_revision_hash,
        &run.browser_name,
    )
    .await?;
    savepoint.commit().await
}
