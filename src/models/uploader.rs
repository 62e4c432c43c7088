use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Uploader {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
