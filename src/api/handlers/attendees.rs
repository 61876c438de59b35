//! Attendee registration for events.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};
use tracing::{error, instrument, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    auth::{storage::find_user_by_id, CurrentUser},
    events::{find_event, Event},
    is_unique_violation,
    users::UserSummary,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeListResponse {
    pub total_attendees: usize,
    pub event_id: Uuid,
    pub event_name: String,
    pub attendees: Vec<UserSummary>,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttendedEventsResponse {
    pub attendee_id: Uuid,
    pub total_events: usize,
    pub events: Vec<Event>,
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/attendees/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Event id"),
        ("user_id" = Uuid, Path, description = "User to register"),
    ),
    responses(
        (status = 201, description = "Attendee registered", body = Attendee, content_type = "application/json"),
        (status = 400, description = "The event owner cannot attend their own event"),
        (status = 404, description = "Event or user not found"),
        (status = 409, description = "User is already registered for this event"),
    ),
    security(("bearer_auth" = [])),
    tag = "attendees"
)]
#[instrument(skip_all)]
pub async fn register_attendee(
    pool: Extension<PgPool>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let event = match find_event(&pool, event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Event not found" })),
            )
                .into_response()
        }
        Err(err) => {
            error!("failed to fetch event {event_id}: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve event" })),
            )
                .into_response();
        }
    };

    match find_user_by_id(&pool, user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "User not found" })),
            )
                .into_response()
        }
        Err(err) => {
            error!("failed to fetch user {user_id}: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve user" })),
            )
                .into_response();
        }
    }

    if event.owner_id == user_id {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "The event owner cannot attend their own event" })),
        )
            .into_response();
    }

    match insert_attendee(&pool, event_id, user_id).await {
        Ok(attendee) => (StatusCode::CREATED, Json(attendee)).into_response(),
        Err(err) if is_unique_violation(&err) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "User is already registered for this event" })),
        )
            .into_response(),
        Err(err) => {
            error!("failed to register attendee: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to register attendee" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/attendees",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Attendees for the event", body = AttendeeListResponse, content_type = "application/json"),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "attendees"
)]
#[instrument(skip_all)]
pub async fn list_attendees(
    pool: Extension<PgPool>,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse {
    let event = match find_event(&pool, event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Event not found" })),
            )
                .into_response()
        }
        Err(err) => {
            error!("failed to fetch event {event_id}: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve event" })),
            )
                .into_response();
        }
    };

    match fetch_attendees(&pool, event_id).await {
        Ok(attendees) => (
            StatusCode::OK,
            Json(AttendeeListResponse {
                total_attendees: attendees.len(),
                event_id,
                event_name: event.name,
                attendees,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("failed to list attendees for event {event_id}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve attendees" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/attendees/{user_id}/events",
    params(("user_id" = Uuid, Path, description = "Attendee user id")),
    responses(
        (status = 200, description = "Events the user attends", body = AttendedEventsResponse, content_type = "application/json"),
    ),
    security(("bearer_auth" = [])),
    tag = "attendees"
)]
#[instrument(skip_all)]
pub async fn events_by_attendee(
    pool: Extension<PgPool>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    match fetch_attended_events(&pool, user_id).await {
        Ok(events) => (
            StatusCode::OK,
            Json(AttendedEventsResponse {
                attendee_id: user_id,
                total_events: events.len(),
                events,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("failed to list events for attendee {user_id}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve events" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}/attendees/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Event id"),
        ("user_id" = Uuid, Path, description = "Attendee to remove"),
    ),
    responses(
        (status = 204, description = "Attendee removed"),
        (status = 403, description = "Only the event owner or the attendee may remove a registration"),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "attendees"
)]
#[instrument(skip_all)]
pub async fn remove_attendee(
    pool: Extension<PgPool>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let event = match find_event(&pool, event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Event not found" })),
            )
                .into_response()
        }
        Err(err) => {
            error!("failed to fetch event {event_id}: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve event" })),
            )
                .into_response();
        }
    };

    if event.owner_id != user.id && user.id != user_id {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Only the event owner or the attendee may remove a registration" })),
        )
            .into_response();
    }

    match delete_attendee(&pool, event_id, user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("failed to remove attendee {user_id} from event {event_id}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to remove attendee" })),
            )
                .into_response()
        }
    }
}

async fn insert_attendee(
    pool: &PgPool,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<Attendee, sqlx::Error> {
    let query = "INSERT INTO attendees (event_id, user_id) VALUES ($1, $2) RETURNING id";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(event_id)
        .bind(user_id)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(Attendee {
        id: row.get("id"),
        event_id,
        user_id,
    })
}

async fn fetch_attendees(pool: &PgPool, event_id: Uuid) -> Result<Vec<UserSummary>, sqlx::Error> {
    let query = "SELECT u.id, u.username, u.email FROM users u \
                 JOIN attendees a ON a.user_id = u.id \
                 WHERE a.event_id = $1 ORDER BY u.username";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(event_id)
        .fetch_all(pool)
        .instrument(span)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
        })
        .collect())
}

async fn fetch_attended_events(pool: &PgPool, user_id: Uuid) -> Result<Vec<Event>, sqlx::Error> {
    let query = "SELECT e.id, e.name, e.description, e.date, e.location, e.owner_id \
                 FROM events e \
                 JOIN attendees a ON a.event_id = e.id \
                 WHERE a.user_id = $1 ORDER BY e.date";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Event {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            date: row.get("date"),
            location: row.get("location"),
            owner_id: row.get("owner_id"),
        })
        .collect())
}

async fn delete_attendee(pool: &PgPool, event_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    let query = "DELETE FROM attendees WHERE event_id = $1 AND user_id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(event_id)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}
