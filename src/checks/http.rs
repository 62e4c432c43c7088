use async_trait::async_trait;
use serde_json::json;

use crate::config::ChecksConfig;

use super::{CheckError, CheckOutcome, CheckReporter, CheckRequest, CheckStatus};

const RESPONSE_BODY_LIMIT: usize = 1024;

/// Posts completed check runs as JSON to a configured URL.
pub struct HttpCheckReporter {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpCheckReporter {
    pub fn new(config: &ChecksConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build reqwest client: {e}"))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl CheckReporter for HttpCheckReporter {
    fn id(&self) -> &str {
        "http"
    }

    async fn complete_check_run(&self, request: &CheckRequest) -> Result<CheckOutcome, CheckError> {
        let mut req = self.client.post(&self.url).json(request);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| CheckError::from(format!("Check report request failed: {e}")))?;

        let status_code = resp.status().as_u16();
        let resp_body = resp
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(RESPONSE_BODY_LIMIT)
            .collect::<String>();

        let status = if (200..300).contains(&status_code) {
            CheckStatus::Success
        } else {
            CheckStatus::Failed
        };

        Ok(CheckOutcome {
            status,
            response: Some(json!({
                "status_code": status_code,
                "body": resp_body,
            })),
        })
    }
}
