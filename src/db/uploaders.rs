use sqlx::PgPool;

use crate::auth::password;
use crate::models::Uploader;

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<Uploader>, sqlx::Error> {
    sqlx::query_as::<_, Uploader>("SELECT * FROM uploaders WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Insert the uploader, or replace its password hash if it already exists.
pub async fn upsert(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<Uploader, sqlx::Error> {
    sqlx::query_as::<_, Uploader>(
        "INSERT INTO uploaders (username, password_hash) VALUES ($1, $2)
         ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash
         RETURNING *",
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

/// Check a credential pair against the stored hash. Unknown usernames and
/// unparseable hashes both yield `false`.
pub async fn authenticate(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<bool, sqlx::Error> {
    let Some(uploader) = find_by_username(pool, username).await? else {
        return Ok(false);
    };

    match password::verify(password, &uploader.password_hash) {
        Ok(valid) => Ok(valid),
        Err(e) => {
            tracing::warn!("Stored hash for uploader {username} is unusable: {e}");
            Ok(false)
        }
    }
}
