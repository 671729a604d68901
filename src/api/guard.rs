use axum::http::HeaderMap;

use super::error::ApiError;
use crate::config::Config;

/// Header carrying the shared manage secret.
pub const MANAGE_SECRET_HEADER: &str = "api-secret";

/// Access guard for the /manage endpoints.
///
/// With no secret configured the guard is open. With one configured, the
/// request must present a matching `Api-Secret` header; absence counts as a
/// mismatch. Callers invoke this before validating parameters or touching a
/// provider, so a rejected request causes no state change.
pub fn check_manage_secret(headers: &HeaderMap, config: &Config) -> Result<(), ApiError> {
    let Some(expected) = config.server.manage_secret.as_deref() else {
        return Ok(());
    };

    let presented = headers
        .get(MANAGE_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if presented != expected {
        return Err(ApiError::Forbidden);
    }

    Ok(())
}
