use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// The submission shape accepted from uploaders. Every field is optional on
/// the wire; `id` and `created_at` are accepted but never trusted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunSubmission {
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub browser_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub browser_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub os_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub os_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub revision: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_revision_hash: String,
    #[serde(deserialize_with = "null_as_default")]
    pub results_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_results_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    pub time_start: Option<DateTime<Utc>>,
    pub time_end: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a JSON request body into a submission.
pub fn parse_body(body: &[u8]) -> Result<RunSubmission, String> {
    serde_json::from_slice(body).map_err(|e| format!("Failed to parse JSON: {e}"))
}
