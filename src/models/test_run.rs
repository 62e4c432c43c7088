use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored test run. `id` is the key generated by the store on insert.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct TestRun {
    pub id: i64,
    pub browser_name: String,
    pub browser_version: String,
    pub os_name: String,
    pub os_version: String,
    pub revision: String,
    pub full_revision_hash: String,
    pub results_url: String,
    pub raw_results_url: String,
    pub labels: Vec<String>,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A validated run that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTestRun {
    pub browser_name: String,
    pub browser_version: String,
    pub os_name: String,
    pub os_version: String,
    pub revision: String,
    pub full_revision_hash: String,
    pub results_url: String,
    pub raw_results_url: String,
    pub labels: Vec<String>,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
