use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};

use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

/// The reserved uploader whose password is only known to the results
/// processing pipeline. It is the only identity allowed to create runs.
pub const INTERNAL_USERNAME: &str = "_processor";

const AUTH_FAILED: &str = "Authentication error";

/// An authenticated internal uploader, extracted from HTTP Basic credentials.
#[derive(Debug, Clone)]
pub struct InternalUploader {
    pub username: String,
}

/// Pull Basic credentials out of the headers, returning `None` when the
/// header is missing, not Basic, or not decodable.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let auth = headers.typed_get::<Authorization<Basic>>()?;
    Some((auth.username().to_string(), auth.password().to_string()))
}

impl FromRequestParts<SharedState> for InternalUploader {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppError::Unauthorized(AUTH_FAILED.to_string());

        let (username, password) = basic_credentials(&parts.headers).ok_or_else(unauthorized)?;

        // Checked before the store lookup; no other uploader may create runs.
        if username != INTERNAL_USERNAME {
            tracing::debug!("Rejected upload from non-internal uploader {username}");
            return Err(unauthorized());
        }

        match db::uploaders::authenticate(&state.pool, &username, &password).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Rejected upload with invalid password for {username}");
                return Err(unauthorized());
            }
            // A lookup failure is reported to the caller like any other bad credential.
            Err(e) => {
                tracing::error!("Uploader lookup failed for {username}: {e}");
                return Err(unauthorized());
            }
        }

        Ok(InternalUploader { username })
    }
}
