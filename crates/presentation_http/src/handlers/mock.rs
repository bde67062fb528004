//! Mock responses
//!
//! Every request that no other route claims lands here. Configured routes
//! answer with their canned response; anything else gets a JSON echo of the
//! request line.

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::state::AppState;

/// Fallback handler serving configured mock routes
pub async fn mock_response(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let path = uri.path();

    if let Some(route) = state
        .config
        .server
        .routes
        .iter()
        .find(|route| route.matches(method.as_str(), path))
    {
        let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::OK);
        return (
            status,
            [(header::CONTENT_TYPE, route.content_type.clone())],
            route.body.clone(),
        )
            .into_response();
    }

    Json(json!({
        "method": method.as_str(),
        "path": path,
        "query": uri.query(),
        "message": "mockwarden default response",
    }))
    .into_response()
}
