//! Recording middleware
//!
//! Buffers the request and response bodies, rebuilds the exchange and hands
//! it to the recording engine on a background task so that capture never
//! delays the response. Requests whose body exceeds the buffer limit are
//! passed through untouched and only counted.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use application::ports::{CHAOS_APPLIED_KEY, CHAOS_SCENARIO_KEY, Exchange, HttpExchange};
use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::header::CONTENT_LENGTH,
    response::{IntoResponse, Response},
};
use infrastructure::RecordingEngine;
use serde_json::Value;
use tower::{Layer, Service};
use tracing::warn;

use super::{
    ChaosMarker,
    exchange::{request_exchange, to_headers},
    is_admin_path,
};
use crate::error::ApiError;

/// Layer capturing exchanges into the recording engine
#[derive(Debug, Clone)]
pub struct RecordingLayer {
    engine: Arc<RecordingEngine>,
    max_body_bytes: usize,
}

impl RecordingLayer {
    /// Requests with a body above `max_body_bytes` are not recorded
    pub const fn new(engine: Arc<RecordingEngine>, max_body_bytes: usize) -> Self {
        Self {
            engine,
            max_body_bytes,
        }
    }
}

impl<S> Layer<S> for RecordingLayer {
    type Service = RecordingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RecordingService {
            inner,
            engine: Arc::clone(&self.engine),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

/// Service capturing exchanges into the recording engine
#[derive(Debug, Clone)]
pub struct RecordingService<S> {
    inner: S,
    engine: Arc<RecordingEngine>,
    max_body_bytes: usize,
}

impl<S> Service<Request<Body>> for RecordingService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        if is_admin_path(request.uri().path()) {
            return Box::pin(inner.call(request));
        }

        let engine = Arc::clone(&self.engine);
        if !engine.is_enabled() {
            // Still counted so total traffic is visible while capture is off
            let exchange = HttpExchange::new(request.method().as_str(), request.uri().to_string());
            return Box::pin(async move {
                let response = inner.call(request).await?;
                if let Err(e) = engine.record(&exchange, &[], Duration::ZERO).await {
                    warn!(uri = %exchange.uri(), error = %e, "Failed to record exchange");
                }
                Ok(response)
            });
        }

        let max_body_bytes = self.max_body_bytes;

        Box::pin(async move {
            let (parts, body) = request.into_parts();

            let declared = parts
                .headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok());
            if let Some(len) = declared.filter(|len| *len > max_body_bytes) {
                engine.record_oversized(&request_exchange(&parts, &[]), len);
                return inner.call(Request::from_parts(parts, body)).await;
            }

            let request_body = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Ok(ApiError::BadRequest(format!("failed to read request body: {e}"))
                        .into_response());
                },
            };
            if request_body.len() > max_body_bytes {
                engine.record_oversized(&request_exchange(&parts, &[]), request_body.len());
                return inner.call(Request::from_parts(parts, Body::from(request_body))).await;
            }

            let mut exchange = request_exchange(&parts, &request_body);
            let request = Request::from_parts(parts, Body::from(request_body));

            let started = Instant::now();
            let response = inner.call(request).await?;
            let duration = started.elapsed();

            let (parts, body) = response.into_parts();
            let response_body = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Ok(ApiError::Internal(format!("failed to read response: {e}"))
                        .into_response());
                },
            };

            if let Some(marker) = parts.extensions.get::<ChaosMarker>() {
                exchange.set_value(CHAOS_APPLIED_KEY, Value::Bool(true));
                exchange.set_value(CHAOS_SCENARIO_KEY, Value::String(marker.scenario.clone()));
            }
            let exchange = exchange.with_response(
                parts.status.as_u16(),
                to_headers(&parts.headers),
                Vec::new(),
            );

            let captured = response_body.clone();
            tokio::spawn(async move {
                if let Err(e) = engine.record(&exchange, &captured, duration).await {
                    warn!(uri = %exchange.uri(), error = %e, "Failed to record exchange");
                }
            });

            Ok(Response::from_parts(parts, Body::from(response_body)))
        })
    }
}
