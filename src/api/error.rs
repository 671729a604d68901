use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

use super::models::ErrorResponse;
use crate::sites::{RegistryError, SiteError};

/// The closed error taxonomy surfaced by the gateway.
///
/// Every failure in the system maps to exactly one variant; provider errors
/// are funneled through the `From<SiteError>` conversion below and never
/// reach a caller raw.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("forbidden")]
    Forbidden,
    #[error("site not supported: {0}")]
    SiteNotSupported(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::SiteNotSupported(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::SiteNotSupported(_) => "SITE_NOT_SUPPORTED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(json!(body))).into_response()
    }
}

/// The error normalizer: the only place provider failures are interpreted.
/// `NotFound` keeps its missing-resource class; anything else (upstream or
/// decode trouble) is an internal error.
impl From<SiteError> for ApiError {
    fn from(value: SiteError) -> Self {
        match value {
            SiteError::NotFound(message) => ApiError::NotFound(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::SiteNotSupported(site) => ApiError::SiteNotSupported(site),
        }
    }
}

impl From<crate::tasks::StoreError> for ApiError {
    fn from(value: crate::tasks::StoreError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidArgument(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes_match_taxonomy() {
        assert_eq!(
            ApiError::InvalidArgument("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::SiteNotSupported("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn provider_errors_normalize_totally() {
        let not_found: ApiError = SiteError::NotFound("comic 9".into()).into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let upstream: ApiError = SiteError::Upstream("connection reset".into()).into();
        assert!(matches!(upstream, ApiError::Internal(_)));

        let decode: ApiError = SiteError::Decode("bad json".into()).into();
        assert!(matches!(decode, ApiError::Internal(_)));
    }
}
