//! Access gate for protected routes.

use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::{
    error::AuthError, state::AuthState, storage, tokens::TokenError, types::CurrentUser,
};

/// Validate the bearer token, resolve the user, and thread the identity to
/// downstream handlers through the request extensions.
///
/// Access-token validity is purely cryptographic and time-based; the session
/// store is never consulted here, so protected-request latency does not
/// depend on its availability.
///
/// # Errors
/// `MissingCredentials`, `InvalidOrExpiredToken`, `MalformedClaims`, or
/// `UserNotFound`, each answered as a client error.
pub async fn require_auth(
    auth: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingCredentials)?;

    let claims = auth
        .sessions()
        .verify_access_token(&token)
        .map_err(|err| match err {
            TokenError::MalformedClaims => AuthError::MalformedClaims,
            TokenError::Expired | TokenError::InvalidSignature => AuthError::InvalidOrExpiredToken,
        })?;

    // A deleted account is a hard reject even while its tokens are unexpired.
    let user = storage::find_user_by_id(&pool, claims.user_id)
        .await
        .map_err(|err| {
            error!("failed to resolve user {}: {err:?}", claims.user_id);
            AuthError::Internal(err)
        })?
        .ok_or(AuthError::UserNotFound)?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("token-without-scheme"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_rejects_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_token_extracts_the_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }
}
