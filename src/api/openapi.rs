//! OpenAPI document assembly for the swagger UI and schema endpoint.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::handlers::{attendees, auth, events, health, users};

#[derive(OpenApi)]
#[openapi(
    info(description = "Multi-tenant event and attendee registry"),
    paths(
        health::health,
        users::register,
        users::list_users,
        auth::login,
        auth::refresh,
        auth::logout,
        events::list_events,
        events::get_event,
        events::create_event,
        events::update_event,
        events::delete_event,
        attendees::register_attendee,
        attendees::list_attendees,
        attendees::events_by_attendee,
        attendees::remove_attendee,
    ),
    components(schemas(
        users::RegisterRequest,
        users::UserSummary,
        users::UserListResponse,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::RefreshRequest,
        auth::types::TokenPair,
        events::Event,
        events::CreateEventRequest,
        events::UpdateEventRequest,
        events::EventListResponse,
        attendees::Attendee,
        attendees::AttendeeListResponse,
        attendees::AttendedEventsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login, token rotation and logout"),
        (name = "events", description = "Event management"),
        (name = "attendees", description = "Attendee registration"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds_and_registers_the_auth_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components present");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(!doc.paths.paths.is_empty());
    }
}
