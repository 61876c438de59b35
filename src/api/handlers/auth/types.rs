//! User model and request/response types for auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User row as held by the relational store. The auth core only ever reads
/// the password hash; it never serializes.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Identity resolved by the access gate and threaded to downstream handlers
/// through the request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub secret: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub user_name: String,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Freshly minted access/refresh pair. Also the refresh response body.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_response_uses_camel_case_keys() -> Result<()> {
        let response = LoginResponse {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            user_id: Uuid::new_v4(),
            user_name: "alice".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        value.get("accessToken").context("missing accessToken")?;
        value.get("refreshToken").context("missing refreshToken")?;
        value.get("userId").context("missing userId")?;
        value.get("userName").context("missing userName")?;
        Ok(())
    }

    #[test]
    fn refresh_request_round_trips() -> Result<()> {
        let request: RefreshRequest =
            serde_json::from_value(serde_json::json!({ "refreshToken": "tok" }))?;
        assert_eq!(request.refresh_token, "tok");
        Ok(())
    }

    #[test]
    fn user_never_serializes_its_password_hash() -> Result<()> {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "phc-string".to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user)?;
        assert!(value.get("password_hash").is_none());
        Ok(())
    }
}
