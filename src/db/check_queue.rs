use std::time::Duration;

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::CheckQueueItem;

pub async fn enqueue<'e, E: PgExecutor<'e>>(
    executor: E,
    run_id: i64,
    full_revision_hash: &str,
    browser_name: &str,
) -> Result<CheckQueueItem, sqlx::Error> {
    sqlx::query_as::<_, CheckQueueItem>(
        "INSERT INTO check_queue (run_id, full_revision_hash, browser_name)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(run_id)
    .bind(full_revision_hash)
    .bind(browser_name)
    .fetch_one(executor)
    .await
}

/// Atomically claim the next ready item using SELECT FOR UPDATE SKIP LOCKED.
///
/// A claim holds the item for `lease`: `next_retry_at` moves to the end of the
/// lease, and a `processing` item whose lease ran out is claimed again, so an
/// item abandoned by a crashed worker or a failed mark is not lost. Items that
/// exhausted their attempts are never claimed again.
pub async fn claim_next(
    pool: &PgPool,
    lease: Duration,
) -> Result<Option<CheckQueueItem>, sqlx::Error> {
    sqlx::query_as::<_, CheckQueueItem>(
        "UPDATE check_queue
         SET status = 'processing',
             attempts = attempts + 1,
             next_retry_at = now() + make_interval(secs => $1::double precision)
         WHERE id = (
             SELECT id FROM check_queue
             WHERE ((status IN ('pending', 'failed') AND attempts < max_attempts)
                    OR status = 'processing')
               AND next_retry_at <= now()
             ORDER BY next_retry_at ASC
             LIMIT 1
             FOR UPDATE SKIP LOCKED
         )
         RETURNING *",
    )
    .bind(lease.as_secs_f64())
    .fetch_optional(pool)
    .await
}

pub async fn mark_completed(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE check_queue SET status = 'completed', last_error = NULL, completed_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark as failed with exponential backoff. If max attempts reached, stays 'failed' permanently.
pub async fn mark_failed(
    pool: &PgPool,
    id: Uuid,
    attempts: i32,
    max_attempts: i32,
    error: &str,
) -> Result<(), sqlx::Error> {
    if attempts >= max_attempts {
        sqlx::query(
            "UPDATE check_queue SET status = 'failed', last_error = $2, completed_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
    } else {
        sqlx::query(
            "UPDATE check_queue
             SET status = 'failed',
                 last_error = $2,
                 next_retry_at = now() + make_interval(secs => $3::double precision)
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(backoff_secs(attempts) as f64)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Retry delay after the given number of attempts: 2^attempts seconds, capped at one hour.
pub fn backoff_secs(attempts: i32) -> i64 {
    let exp = attempts.clamp(0, 30) as u32;
    2_i64.pow(exp).min(3600)
}

pub async fn list_by_run(pool: &PgPool, run_id: i64) -> Result<Vec<CheckQueueItem>, sqlx::Error> {
    sqlx::query_as::<_, CheckQueueItem>(
        "SELECT * FROM check_queue WHERE run_id = $1 ORDER BY created_at ASC",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await
}
