//! Password hashing and verification.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Compare a submitted secret against a stored PHC hash.
///
/// Fails closed: a malformed hash or backend error verifies as `false`,
/// never as a match.
#[must_use]
pub fn verify(stored_hash: &str, secret: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash("hunter2pass").expect("hash password");
        assert!(verify(&hash, "hunter2pass"));
    }

    #[test]
    fn wrong_secret_does_not_verify() {
        let hash = hash("hunter2pass").expect("hash password");
        assert!(!verify(&hash, "hunter2paSS"));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash("hunter2pass").expect("hash password");
        let second = hash("hunter2pass").expect("hash password");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_fails_closed() {
        assert!(!verify("not-a-phc-string", "hunter2pass"));
        assert!(!verify("", "hunter2pass"));
    }
}
