use chrono::{DateTime, Utc};

use crate::models::NewTestRun;

use super::parser::RunSubmission;

/// Length of a complete source-control revision identifier.
pub const FULL_REVISION_LEN: usize = 40;

/// Length of the short revision stored alongside the full hash.
pub const SHORT_REVISION_LEN: usize = 10;

/// Seconds since the Unix epoch of 0001-01-01T00:00:00Z, the value an unset
/// timestamp serializes to in other dashboard components.
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

/// A timestamp counts as unset when absent or equal to the zero instant.
pub fn is_zero(ts: Option<DateTime<Utc>>) -> bool {
    match ts {
        None => true,
        Some(t) => t.timestamp() == ZERO_INSTANT_SECS && t.timestamp_subsec_nanos() == 0,
    }
}

/// Resolve `(time_start, time_end, created_at)` for a submission ingested at `now`.
pub fn resolve_times(
    time_start: Option<DateTime<Utc>>,
    time_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
    let start = match time_start {
        Some(t) if !is_zero(Some(t)) => t,
        _ => now,
    };
    let end = match time_end {
        Some(t) if !is_zero(Some(t)) => t,
        _ => start,
    };
    (start, end, now)
}

/// Validate the revision fields and return the short revision to store.
///
/// The full hash must be exactly [`FULL_REVISION_LEN`] characters. A supplied
/// short revision is only checked for being a prefix of the full hash; the
/// stored value is always derived from the full hash.
pub fn resolve_revision(full_revision_hash: &str, revision: &str) -> Result<String, String> {
    if full_revision_hash.chars().count() != FULL_REVISION_LEN {
        return Err(format!(
            "full_revision_hash must be the full SHA ({FULL_REVISION_LEN} chars)"
        ));
    }

    if !revision.is_empty() && !full_revision_hash.starts_with(revision) {
        return Err(format!(
            "Mismatch of full_revision_hash and revision fields: {full_revision_hash} vs {revision}"
        ));
    }

    Ok(full_revision_hash.chars().take(SHORT_REVISION_LEN).collect())
}

/// Turn a parsed submission into a run ready to be stored.
pub fn normalize(submission: RunSubmission, now: DateTime<Utc>) -> Result<NewTestRun, String> {
    let (time_start, time_end, created_at) =
        resolve_times(submission.time_start, submission.time_end, now);

    let revision = resolve_revision(&submission.full_revision_hash, &submission.revision)?;

    Ok(NewTestRun {
        browser_name: submission.browser_name,
        browser_version: submission.browser_version,
        os_name: submission.os_name,
        os_version: submission.os_version,
        revision,
        full_revision_hash: submission.full_revision_hash,
        results_url: submission.results_url,
        raw_results_url: submission.raw_results_url,
        labels: submission.labels,
        time_start,
        time_end,
        created_at,
    })
}
