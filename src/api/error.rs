//! HTTP rendering of domain errors.

use std::fmt;

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::auth::AuthError;
use crate::roster::RosterError;

/// Error returned by every handler. Renders as `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Auth(AuthError),
    Roster(RosterError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(e) => e.status_code(),
            Self::Roster(e) => e.status_code(),
        }
    }

    /// Client-visible detail. Internal failures are not described.
    pub fn detail(&self) -> String {
        match self {
            Self::Auth(AuthError::Internal(_))
            | Self::Roster(RosterError::Unauthorized(AuthError::Internal(_))) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "{}", e),
            Self::Roster(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        Self::Roster(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(RosterError::ActivityNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RosterError::AlreadySignedUp).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RosterError::Unauthorized(AuthError::Unauthenticated)).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError::from(AuthError::Internal("entropy pool exploded".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Internal server error");

        let err = ApiError::from(RosterError::CapacityExceeded);
        assert_eq!(err.detail(), "Activity is full");
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ApiError::from(RosterError::NotRegistered).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({ "detail": "Student is not signed up for this activity" })
        );
    }
}
