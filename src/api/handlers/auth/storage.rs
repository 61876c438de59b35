//! User lookups backing login and the access gate.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::User;

pub(crate) async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let query = "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user by email")?;

    Ok(row.map(user_from_row))
}

pub(crate) async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let query = "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user by id")?;

    Ok(row.map(user_from_row))
}

fn user_from_row(row: PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}
