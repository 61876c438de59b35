//! Auth configuration and shared state.
//!
//! The signing secret, store handle, and TTLs are injected at construction
//! time (never looked up ambiently) so tests can run isolated secrets and
//! stores per test.

use super::session::SessionManager;

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_ttl_seconds)
    }

    #[must_use]
    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_ttl_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AuthState {
    config: AuthConfig,
    sessions: SessionManager,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, sessions: SessionManager) -> Self {
        Self { config, sessions }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new();
        assert_eq!(config.access_token_ttl(), chrono::Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl(), chrono::Duration::days(7));

        let config = config
            .with_access_token_ttl_seconds(60)
            .with_refresh_token_ttl_seconds(3600);
        assert_eq!(config.access_token_ttl(), chrono::Duration::seconds(60));
        assert_eq!(config.refresh_token_ttl(), chrono::Duration::seconds(3600));
    }
}
