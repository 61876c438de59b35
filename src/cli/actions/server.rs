use crate::api;
use crate::api::handlers::auth::AuthConfig;
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            redis_url,
            cors_origin,
        } => {
            // Parse early so a malformed DSN fails before any connection attempt.
            let dsn = Url::parse(&dsn)?.to_string();

            api::new(port, dsn, redis_url, cors_origin, globals, AuthConfig::new()).await?;
        }
    }

    Ok(())
}
