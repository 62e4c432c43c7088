pub mod extractor;
pub mod password;

use sqlx::PgPool;

use crate::db;

pub use extractor::{INTERNAL_USERNAME, InternalUploader};

/// Create the internal uploader, or rotate its password if it already exists.
pub async fn seed_internal_uploader(pool: &PgPool, plaintext: &str) -> Result<(), String> {
    let hash = password::hash(plaintext)?;
    db::uploaders::upsert(pool, INTERNAL_USERNAME, &hash)
        .await
        .map_err(|e| format!("Failed to store internal uploader: {e}"))?;
    Ok(())
}
