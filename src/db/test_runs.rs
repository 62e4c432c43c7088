use sqlx::PgPool;

use crate::models::{NewTestRun, TestRun};

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    run: &NewTestRun,
) -> Result<TestRun, sqlx::Error> {
    sqlx::query_as::<_, TestRun>(
        "INSERT INTO test_runs (
             browser_name, browser_version, os_name, os_version,
             revision, full_revision_hash, results_url, raw_results_url,
             labels, time_start, time_end, created_at
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
    )
    .bind(&run.browser_name)
    .bind(&run.browser_version)
    .bind(&run.os_name)
    .bind(&run.os_version)
    .bind(&run.revision)
    .bind(&run.full_revision_hash)
    .bind(&run.results_url)
    .bind(&run.raw_results_url)
    .bind(&run.labels)
    .bind(run.time_start)
    .bind(run.time_end)
    .bind(run.created_at)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<TestRun>, sqlx::Error> {
    sqlx::query_as::<_, TestRun>("SELECT * FROM test_runs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count_by_full_revision_hash(
    pool: &PgPool,
    full_revision_hash: &str,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM test_runs WHERE full_revision_hash = $1")
            .bind(full_revision_hash)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}
