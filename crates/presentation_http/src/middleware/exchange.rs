//! Conversions between axum requests/responses and [`HttpExchange`]

use std::net::SocketAddr;

use application::ports::{Exchange, HttpExchange, REQUEST_ID_KEY};
use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, request},
    response::Response,
};
use domain::Headers;
use serde_json::Value;

use super::RequestId;

/// Flatten a header map, joining repeated values with `, `
pub fn to_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}

/// Build an exchange from request parts and a buffered body
pub fn request_exchange(parts: &request::Parts, body: &[u8]) -> HttpExchange {
    let uri = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    let mut exchange = HttpExchange::new(parts.method.as_str(), uri).with_body(body.to_vec());
    for (name, value) in to_headers(&parts.headers) {
        exchange = exchange.with_header(&name, value);
    }
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        exchange = exchange.with_remote_addr(addr.to_string());
    }
    if let Some(id) = parts.extensions.get::<RequestId>() {
        exchange.set_value(REQUEST_ID_KEY, Value::String(id.to_string()));
    }
    exchange
}

/// Turn an exchange's response half into an axum response
pub fn exchange_response(exchange: HttpExchange) -> Response {
    let (status, headers, body) = exchange.into_response_parts();

    let mut response = Response::new(Body::from(Bytes::from(body)));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}
