//! Authentication: credential login, refresh-token rotation, and logout.
//!
//! Sessions ride on two signed tokens: a short-lived access token validated
//! statelessly by the gate, and a long-lived refresh token whose validity is
//! additionally pinned to a single stored pointer per user. A new login or
//! refresh overwrites the pointer, permanently invalidating any previously
//! issued refresh token for that user.

pub mod error;
pub mod middleware;
pub mod password;
pub mod session;
pub mod state;
pub(crate) mod storage;
pub mod store;
pub mod tokens;
pub mod types;


pub use error::AuthError;
pub use middleware::require_auth;
pub use session::SessionManager;
pub use state::{AuthConfig, AuthState};
pub use store::{RedisSessionStore, SessionStore};
pub use types::CurrentUser;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::api::handlers::valid_email;
use types::{LoginRequest, LoginResponse, RefreshRequest};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse, content_type = "application/json"),
        (status = 401, description = "Invalid email or password"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    auth: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(credentials)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing payload" })),
        )
            .into_response();
    };

    if !valid_email(&credentials.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid email" })),
        )
            .into_response();
    }

    let user = match storage::find_user_by_email(&pool, &credentials.email).await {
        Ok(Some(user)) => user,
        // Unknown email answers exactly like a wrong password.
        Ok(None) => return AuthError::InvalidCredentials.into_response(),
        Err(err) => {
            error!("failed to look up user for login: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to log in" })),
            )
                .into_response();
        }
    };

    match auth.sessions().login(&user, &credentials.secret).await {
        Ok(pair) => (
            StatusCode::OK,
            Json(LoginResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                user_id: user.id,
                user_name: user.username,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = types::TokenPair, content_type = "application/json"),
        (status = 401, description = "Invalid or displaced refresh token"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(
    auth: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing payload" })),
        )
            .into_response();
    };

    match auth.sessions().refresh(&request.refresh_token).await {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout/{id}",
    params(("id" = Uuid, Path, description = "User id to log out")),
    responses(
        (status = 200, description = "Session cleared"),
        (status = 403, description = "Cannot log out another user"),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(
    auth: Extension<Arc<AuthState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    if user.id != user_id {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Cannot log out another user" })),
        )
            .into_response();
    }

    match auth.sessions().logout(user_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Successfully logged out" })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
