//! Authentication failure taxonomy and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::store::StoreError;

/// Every failure is scoped to the single request; none is fatal to the
/// process. Credential and token failures are terminal client errors and are
/// never retried locally.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email and wrong password answer identically so accounts
    /// cannot be enumerated.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    /// The stored session pointer is absent or holds a different token:
    /// already rotated away, logged out, or never issued.
    #[error("Refresh token mismatch")]
    RefreshMismatch,
    #[error("Missing or malformed Authorization header")]
    MissingCredentials,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Failed to parse claims")]
    MalformedClaims,
    #[error("User not found")]
    UserNotFound,
    #[error("Session store unavailable")]
    Store(#[from] StoreError),
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            Self::Store(err) => error!("session store failure: {err}"),
            Self::Internal(err) => error!("auth internal failure: {err:?}"),
            _ => {}
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn client_failures_map_to_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::InvalidRefreshToken,
            AuthError::RefreshMismatch,
            AuthError::MissingCredentials,
            AuthError::InvalidOrExpiredToken,
            AuthError::MalformedClaims,
            AuthError::UserNotFound,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn internal_failures_map_to_server_error() {
        let err = AuthError::Internal(anyhow!("boom"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn responses_carry_the_mapped_status() {
        let response = AuthError::RefreshMismatch.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
