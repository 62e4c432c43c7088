use std::sync::Arc;

use sqlx::PgPool;

use crate::checks::CheckReporter;
use crate::config::Config;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    /// `None` when no check-reporting service is configured.
    pub reporter: Option<Arc<dyn CheckReporter>>,
}
