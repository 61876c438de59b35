//! # Convene (event & attendee registry)
//!
//! `convene` is a multi-tenant event and attendee registry exposed over HTTP.
//! Users own events, other users register as attendees, and every mutating
//! operation requires an authenticated session.
//!
//! ## Sessions
//!
//! Authentication rides on two signed tokens minted at login:
//!
//! - **Access token** (15 minutes): self-validating; protected requests are
//!   checked purely cryptographically, with no session-store lookup.
//! - **Refresh token** (7 days): stateful; it must additionally match the
//!   single stored pointer (`refresh:<userId>`) held in the session store.
//!
//! Each successful refresh rotates the pair and overwrites the pointer, so a
//! replayed refresh token dies the instant a newer one is stored. A new login
//! displaces any prior session for the same user, and logout is a single key
//! deletion. Unused sessions lapse through the store's TTL.
//!
//! ## Ownership
//!
//! Events are tenant-scoped by their owner: only the owner may update or
//! delete an event, and the owner cannot be registered as an attendee of
//! their own event.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
