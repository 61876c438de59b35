//! Signed bearer token issuing and parsing.
//!
//! Access and refresh tokens are structurally identical; they differ only in
//! TTL. Purpose is enforced by how the session manager uses them, not by the
//! codec.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    /// Absolute expiry, seconds since the epoch.
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is expired")]
    Expired,
    #[error("token claims are malformed")]
    MalformedClaims,
}

/// Stateless HMAC token codec. Pure function of (claims, ttl, secret, now).
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        // Expiry is exact; the default 60s leeway would keep dead tokens alive.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for `user_id` expiring `ttl` from now.
    pub fn issue(&self, user_id: Uuid, email: &str, ttl: Duration) -> Result<String> {
        let claims = TokenClaims {
            user_id,
            email: email.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).context("failed to sign token")
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::Json(_)
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Utf8(_) => TokenError::MalformedClaims,
                _ => TokenError::InvalidSignature,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-key-12345")
    }

    #[test]
    fn issue_and_parse_round_trip() {
        let user_id = Uuid::new_v4();
        let token = codec()
            .issue(user_id, "alice@example.com", Duration::minutes(15))
            .expect("issue token");

        let claims = codec().parse(&token).expect("parse token");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn different_secrets_reject() {
        let token = TokenCodec::new("secret1")
            .issue(Uuid::new_v4(), "alice@example.com", Duration::minutes(15))
            .expect("issue token");

        let err = TokenCodec::new("secret2").parse(&token).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn expired_token_rejected() {
        let token = codec()
            .issue(Uuid::new_v4(), "alice@example.com", Duration::seconds(-30))
            .expect("issue token");

        assert_eq!(codec().parse(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn tampered_signature_rejected() {
        let mut token = codec()
            .issue(Uuid::new_v4(), "alice@example.com", Duration::minutes(15))
            .expect("issue token");

        // Flip one character in the signature segment.
        let flipped = if token.ends_with('A') { 'B' } else { 'A' };
        token.pop();
        token.push(flipped);

        assert_eq!(codec().parse(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn garbage_token_is_malformed() {
        assert_eq!(
            codec().parse("not.a.token").unwrap_err(),
            TokenError::MalformedClaims
        );
        assert_eq!(codec().parse("").unwrap_err(), TokenError::MalformedClaims);
    }
}
