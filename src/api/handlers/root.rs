use axum::response::{IntoResponse, Json};
use serde_json::json;

// axum handler for the service banner
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
    }))
}
