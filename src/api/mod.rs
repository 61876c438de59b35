use crate::{
    api::handlers::{attendees, auth, events, health, root, users},
    cli::globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::ApiDoc;

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    redis_url: String,
    cors_origin: String,
    globals: &GlobalArgs,
    auth_config: auth::AuthConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let store = auth::RedisSessionStore::connect(&redis_url)
        .await
        .context("Failed to connect to session store")?;

    let sessions = auth::SessionManager::new(
        globals.jwt_secret.expose_secret(),
        Arc::new(store),
        &auth_config,
    );
    let auth_state = Arc::new(auth::AuthState::new(auth_config, sessions));

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::exact(cors_origin_header(&cors_origin)?))
        .allow_credentials(true);

    let app = router()
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(pool)),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Public routes plus the subset gated behind the access-token middleware.
fn router() -> Router {
    let public = Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/:id", get(events::get_event))
        .route("/api/v1/auth/register", post(users::register))
        .route("/api/v1/auth/users", get(users::list_users))
        .route("/api/v1/auth/login", post(auth::login))
        // Refresh takes only the refresh token; an expired access token must
        // not lock a client out of rotating.
        .route("/api/v1/auth/refresh", post(auth::refresh));

    let protected = Router::new()
        .route("/api/v1/events", post(events::create_event))
        .route(
            "/api/v1/events/:id",
            put(events::update_event).delete(events::delete_event),
        )
        .route("/api/v1/events/:id/attendees", get(attendees::list_attendees))
        .route(
            "/api/v1/events/:id/attendees/:user_id",
            post(attendees::register_attendee).delete(attendees::remove_attendee),
        )
        .route(
            "/api/v1/attendees/:user_id/events",
            get(attendees::events_by_attendee),
        )
        .route("/api/v1/auth/logout/:id", post(auth::logout))
        .route_layer(middleware::from_fn(auth::require_auth));

    public.merge(protected)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_origin_header(origin: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(origin).with_context(|| format!("Invalid CORS origin: {origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("CORS origin must include a valid host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let value = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&value).context("Failed to build CORS origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds_without_conflicts() {
        let _router = router();
    }

    #[test]
    fn cors_origin_normalizes_trailing_slash() {
        let value = cors_origin_header("http://localhost:3000/").expect("parse origin");
        assert_eq!(value, HeaderValue::from_static("http://localhost:3000"));
    }

    #[test]
    fn cors_origin_rejects_garbage() {
        assert!(cors_origin_header("not a url").is_err());
    }
}
