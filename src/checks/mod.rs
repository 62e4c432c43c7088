pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The check run to mark complete: one per revision/browser pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub head_sha: String,
    pub browser_name: String,
    pub run_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub response: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Failed,
}

#[derive(Debug)]
pub struct CheckError {
    pub message: String,
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CheckError {}

impl From<String> for CheckError {
    fn from(s: String) -> Self {
        CheckError { message: s }
    }
}

impl From<&str> for CheckError {
    fn from(s: &str) -> Self {
        CheckError {
            message: s.to_string(),
        }
    }
}

/// Reports completed check runs to the external check-reporting service.
#[async_trait]
pub trait CheckReporter: Send + Sync {
    fn id(&self) -> &str;
    async fn complete_check_run(&self, request: &CheckRequest) -> Result<CheckOutcome, CheckError>;
}
