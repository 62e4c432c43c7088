use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::checks::{CheckReporter, CheckRequest, CheckStatus};
use crate::db;
use crate::state::SharedState;

const REPORT_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// How long a claimed item stays reserved. Must outlast `REPORT_TIMEOUT`.
pub const CLAIM_LEASE: Duration = Duration::from_secs(120);

/// Start a worker pool on a dedicated Tokio runtime with its own thread pool.
/// This runs on a separate OS thread and blocks until shutdown is signaled.
pub fn run_pool(
    state: SharedState,
    reporter: Arc<dyn CheckReporter>,
    shutdown: watch::Receiver<bool>,
    worker_count: usize,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("check-worker-pool".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(worker_count)
                .thread_name("check-worker")
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!("Failed to build check worker runtime: {e}");
                    return;
                }
            };

            runtime.block_on(async {
                let mut handles = Vec::with_capacity(worker_count);

                for id in 0..worker_count {
                    handles.push(tokio::spawn(run(
                        id,
                        state.clone(),
                        reporter.clone(),
                        shutdown.clone(),
                    )));
                }

                tracing::info!(
                    "Check worker pool started ({worker_count} workers, reporter={})",
                    reporter.id()
                );

                for handle in handles {
                    let _ = handle.await;
                }

                tracing::info!("Check worker pool stopped");
            });
        })
}

/// A single worker loop that polls the queue and processes items.
async fn run(
    id: usize,
    state: SharedState,
    reporter: Arc<dyn CheckReporter>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!("Check worker {id} started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match process_next(&state, reporter.as_ref()).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Check worker {id} error: {e}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::debug!("Check worker {id} stopped");
}

/// Try to claim and deliver the next queued check notification. Returns true
/// if an item was processed, whatever its outcome.
pub async fn process_next(
    state: &SharedState,
    reporter: &dyn CheckReporter,
) -> Result<bool, String> {
    let item = db::check_queue::claim_next(&state.pool, CLAIM_LEASE)
        .await
        .map_err(|e| format!("Failed to claim queue item: {e}"))?;

    let Some(item) = item else {
        return Ok(false);
    };

    tracing::debug!(
        "Processing check item {} (run={}, sha={}, browser={}, attempt={})",
        item.id,
        item.run_id,
        item.full_revision_hash,
        item.browser_name,
        item.attempts
    );

    let request = CheckRequest {
        head_sha: item.full_revision_hash.clone(),
        browser_name: item.browser_name.clone(),
        run_id: item.run_id,
    };

    let report = tokio::time::timeout(REPORT_TIMEOUT, reporter.complete_check_run(&request));
    let failure = match report.await {
        Ok(Ok(outcome)) if outcome.status == CheckStatus::Success => None,
        Ok(Ok(outcome)) => Some(
            outcome
                .response
                .map(|r| format!("Check service rejected report: {r}"))
                .unwrap_or_else(|| "Check service rejected report".to_string()),
        ),
        Ok(Err(e)) => Some(e.message),
        Err(_) => Some(format!(
            "Check report timed out after {}s",
            REPORT_TIMEOUT.as_secs()
        )),
    };

    match failure {
        None => {
            db::check_queue::mark_completed(&state.pool, item.id)
                .await
                .map_err(|e| format!("Failed to mark item {} completed: {e}", item.id))?;
            tracing::info!(
                "Reported check run complete for {} / {} (run {})",
                item.full_revision_hash,
                item.browser_name,
                item.run_id
            );
        }
        Some(error) => {
            if item.attempts >= item.max_attempts {
                tracing::error!(
                    "Giving up on check item {} after {} attempts: {error}",
                    item.id,
                    item.attempts
                );
            } else {
                tracing::warn!(
                    "Check item {} failed (attempt {}/{}): {error}",
                    item.id,
                    item.attempts,
                    item.max_attempts
                );
            }
            db::check_queue::mark_failed(
                &state.pool,
                item.id,
                item.attempts,
                item.max_attempts,
                &error,
            )
            .await
            .map_err(|e| format!("Failed to mark item {} failed: {e}", item.id))?;
        }
    }

    Ok(true)
}
