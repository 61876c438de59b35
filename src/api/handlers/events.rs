//! Event CRUD with owner enforcement.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{error, instrument, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{auth::CurrentUser, valid_length};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub owner_id: Uuid,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub total_events: usize,
    pub events: Vec<Event>,
}

fn validate_fields(
    name: Option<&str>,
    description: Option<&str>,
    location: Option<&str>,
) -> Option<&'static str> {
    if name.is_some_and(|name| !valid_length(name, 3, 50)) {
        return Some("Name must be between 3 and 50 characters");
    }
    if description.is_some_and(|description| !valid_length(description, 3, 200)) {
        return Some("Description must be between 3 and 200 characters");
    }
    if location.is_some_and(|location| !valid_length(location, 3, 100)) {
        return Some("Location must be between 3 and 100 characters");
    }
    None
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    responses(
        (status = 200, description = "All events", body = EventListResponse, content_type = "application/json"),
    ),
    tag = "events"
)]
#[instrument(skip_all)]
pub async fn list_events(pool: Extension<PgPool>) -> impl IntoResponse {
    match fetch_events(&pool).await {
        Ok(events) => (
            StatusCode::OK,
            Json(EventListResponse {
                total_events: events.len(),
                events,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("failed to list events: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve events" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event", body = Event, content_type = "application/json"),
        (status = 404, description = "Event not found"),
    ),
    tag = "events"
)]
#[instrument(skip_all)]
pub async fn get_event(pool: Extension<PgPool>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match find_event(&pool, id).await {
        Ok(Some(event)) => (StatusCode::OK, Json(event)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Event not found" })),
        )
            .into_response(),
        Err(err) => {
            error!("failed to fetch event {id}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve event" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event, content_type = "application/json"),
        (status = 400, description = "Invalid event payload"),
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
#[instrument(skip_all)]
pub async fn create_event(
    pool: Extension<PgPool>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Option<Json<CreateEventRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing payload" })),
        )
            .into_response();
    };

    if let Some(message) = validate_fields(
        Some(&request.name),
        Some(&request.description),
        Some(&request.location),
    ) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
    }

    // The owner is always the authenticated creator.
    match insert_event(&pool, &request, user.id).await {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(err) => {
            error!("failed to create event: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create event" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = Event, content_type = "application/json"),
        (status = 403, description = "Only the owner may update an event"),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
#[instrument(skip_all)]
pub async fn update_event(
    pool: Extension<PgPool>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    payload: Option<Json<UpdateEventRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing payload" })),
        )
            .into_response();
    };

    let mut event = match find_event(&pool, id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Event not found" })),
            )
                .into_response()
        }
        Err(err) => {
            error!("failed to fetch event {id}: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve event" })),
            )
                .into_response();
        }
    };

    if event.owner_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "You are not the owner of the event" })),
        )
            .into_response();
    }

    if request.name.is_none()
        && request.description.is_none()
        && request.date.is_none()
        && request.location.is_none()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No fields provided to update" })),
        )
            .into_response();
    }

    if let Some(message) = validate_fields(
        request.name.as_deref(),
        request.description.as_deref(),
        request.location.as_deref(),
    ) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
    }

    if let Some(name) = request.name {
        event.name = name;
    }
    if let Some(description) = request.description {
        event.description = description;
    }
    if let Some(date) = request.date {
        event.date = date;
    }
    if let Some(location) = request.location {
        event.location = location;
    }

    match persist_event(&pool, &event).await {
        Ok(()) => (StatusCode::OK, Json(event)).into_response(),
        Err(err) => {
            error!("failed to update event {id}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update event" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Only the owner may delete an event"),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
#[instrument(skip_all)]
pub async fn delete_event(
    pool: Extension<PgPool>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let event = match find_event(&pool, id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Event not found" })),
            )
                .into_response()
        }
        Err(err) => {
            error!("failed to fetch event {id}: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve event" })),
            )
                .into_response();
        }
    };

    if event.owner_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "You are not the owner of the event" })),
        )
            .into_response();
    }

    match remove_event(&pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("failed to delete event {id}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to delete event" })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn find_event(pool: &PgPool, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
    let query =
        "SELECT id, name, description, date, location, owner_id FROM events WHERE id = $1";
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
        .await?;

    Ok(row.map(event_from_row))
}

async fn fetch_events(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
    let query = "SELECT id, name, description, date, location, owner_id FROM events ORDER BY date";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query).fetch_all(pool).instrument(span).await?;

    Ok(rows.into_iter().map(event_from_row).collect())
}

async fn insert_event(
    pool: &PgPool,
    request: &CreateEventRequest,
    owner_id: Uuid,
) -> Result<Event, sqlx::Error> {
    let query = "INSERT INTO events (name, description, date, location, owner_id) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.date)
        .bind(&request.location)
        .bind(owner_id)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(Event {
        id: row.get("id"),
        name: request.name.clone(),
        description: request.description.clone(),
        date: request.date,
        location: request.location.clone(),
        owner_id,
    })
}

async fn persist_event(pool: &PgPool, event: &Event) -> Result<(), sqlx::Error> {
    let query = "UPDATE events SET name = $1, description = $2, date = $3, location = $4 \
                 WHERE id = $5";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .bind(event.id)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}

async fn remove_event(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    let query = "DELETE FROM events WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}

fn event_from_row(row: PgRow) -> Event {
    Event {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        date: row.get("date"),
        location: row.get("location"),
        owner_id: row.get("owner_id"),
    }
}
