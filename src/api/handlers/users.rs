//! User registration and listing.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};
use tracing::{error, instrument, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{auth::password, is_unique_violation, valid_email, valid_length};

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Sanitized user view; no credential material.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub total_users: usize,
    pub users: Vec<UserSummary>,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = UserSummary, content_type = "application/json"),
        (status = 409, description = "A user with the given email already exists"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing payload" })),
        )
            .into_response();
    };

    if !valid_length(&request.name, 3, 50) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Name must be between 3 and 50 characters" })),
        )
            .into_response();
    }

    if !valid_email(&request.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid email" })),
        )
            .into_response();
    }

    if request.password.chars().count() < 8 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Password must be at least 8 characters" })),
        )
            .into_response();
    }

    let password_hash = match password::hash(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("failed to hash password: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to register user" })),
            )
                .into_response();
        }
    };

    match insert_user(&pool, &request.name, &request.email, &password_hash).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) if is_unique_violation(&err) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Email already registered" })),
        )
            .into_response(),
        Err(err) => {
            error!("failed to insert user: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to register user" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/users",
    responses(
        (status = 200, description = "All registered users", body = UserListResponse, content_type = "application/json"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn list_users(pool: Extension<PgPool>) -> impl IntoResponse {
    match fetch_users(&pool).await {
        Ok(users) => (
            StatusCode::OK,
            Json(UserListResponse {
                total_users: users.len(),
                users,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("failed to list users: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve users" })),
            )
                .into_response()
        }
    }
}

async fn insert_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<UserSummary, sqlx::Error> {
    let query = "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(UserSummary {
        id: row.get("id"),
        username: name.to_string(),
        email: email.to_string(),
    })
}

async fn fetch_users(pool: &PgPool) -> Result<Vec<UserSummary>, sqlx::Error> {
    let query = "SELECT id, username, email FROM users ORDER BY username";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query).fetch_all(pool).instrument(span).await?;

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
        })
        .collect())
}
