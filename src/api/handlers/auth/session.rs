//! Session lifecycle state machine: login, refresh, logout.
//!
//! Per user the session is either absent or holds exactly one live refresh
//! pointer. Login and refresh overwrite the pointer (never append), so at
//! most one refresh token per user can ever match. Rotation-with-comparison
//! gives revocation-on-use without a denylist: a stolen refresh token dies
//! the moment the stored pointer moves, and logout is a single key deletion.
//!
//! Two concurrent refreshes with the same still-valid token can both pass the
//! comparison and both write; the second write wins and the first caller's
//! pair dies on its next refresh. That race is accepted: the failure only
//! forces re-login, it never grants access.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::{
    error::AuthError,
    password,
    state::AuthConfig,
    store::SessionStore,
    tokens::{TokenClaims, TokenCodec, TokenError},
    types::{TokenPair, User},
};

fn refresh_key(user_id: Uuid) -> String {
    format!("refresh:{user_id}")
}

fn access_key(user_id: Uuid) -> String {
    format!("access:{user_id}")
}

pub struct SessionManager {
    codec: TokenCodec,
    store: Arc<dyn SessionStore>,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(secret: &str, store: Arc<dyn SessionStore>, config: &AuthConfig) -> Self {
        Self {
            codec: TokenCodec::new(secret),
            store,
            access_ttl: config.access_token_ttl(),
            refresh_ttl: config.refresh_token_ttl(),
        }
    }

    /// Verify credentials and open a session, displacing any prior one.
    ///
    /// # Errors
    /// `InvalidCredentials` when the secret does not verify; store failures
    /// surface as `Store`.
    pub async fn login(&self, user: &User, secret: &str) -> Result<TokenPair, AuthError> {
        if !password::verify(&user.password_hash, secret) {
            return Err(AuthError::InvalidCredentials);
        }
        self.open_session(user.id, &user.email).await
    }

    /// Rotate a presented refresh token into a new pair.
    ///
    /// # Errors
    /// `InvalidRefreshToken` when the token fails signature/expiry/shape
    /// checks; `RefreshMismatch` when the stored pointer is absent or holds a
    /// different token.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let claims: TokenClaims = self
            .codec
            .parse(presented)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let stored = self.store.fetch(&refresh_key(claims.user_id)).await?;
        if stored.as_deref() != Some(presented) {
            return Err(AuthError::RefreshMismatch);
        }

        self.open_session(claims.user_id, &claims.email).await
    }

    /// Drop the session pointer. Idempotent; deleting an absent key is fine.
    ///
    /// # Errors
    /// Store failures surface as `Store`.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.store.remove(&refresh_key(user_id)).await?;
        self.store.remove(&access_key(user_id)).await?;
        debug!("session cleared for user {user_id}");
        Ok(())
    }

    /// Stateless access-token check for the gate; the store is not consulted.
    ///
    /// # Errors
    /// Any codec failure: bad signature, expiry, malformed claims.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.codec.parse(token)
    }

    async fn open_session(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AuthError> {
        let access_token = self.codec.issue(user_id, email, self.access_ttl)?;
        let refresh_token = self.codec.issue(user_id, email, self.refresh_ttl)?;

        // The overwrite is the revocation mechanism: any previously issued
        // refresh token becomes unmatchable the instant the new one lands.
        self.store
            .put(&refresh_key(user_id), &refresh_token, ttl_std(self.refresh_ttl))
            .await?;
        // Mirror for operational visibility only; the access gate never reads it.
        self.store
            .put(&access_key(user_id), &access_token, ttl_std(self.access_ttl))
            .await?;

        debug!("session opened for user {user_id}");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn ttl_std(ttl: chrono::Duration) -> std::time::Duration {
    ttl.to_std().unwrap_or_default()
}
