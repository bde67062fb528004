//! Chaos middleware
//!
//! Asks the chaos engine for a decision on every request. When a scenario
//! fires, its injector runs against an exchange built from the request:
//! an injected response short-circuits the router, otherwise (latency) the
//! request proceeds normally. Injection errors fall back to normal handling.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use application::ports::Exchange;
use axum::{body::Body, extract::Request, response::Response};
use infrastructure::ChaosEngine;
use tower::{Layer, Service};
use tracing::warn;

use super::{
    exchange::{exchange_response, request_exchange},
    is_admin_path,
};

/// Response extension naming the chaos scenario applied to the exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaosMarker {
    pub scenario: String,
}

/// Layer applying chaos scenarios
#[derive(Debug, Clone)]
pub struct ChaosLayer {
    engine: Arc<ChaosEngine>,
}

impl ChaosLayer {
    pub const fn new(engine: Arc<ChaosEngine>) -> Self {
        Self { engine }
    }
}

impl<S> Layer<S> for ChaosLayer {
    type Service = ChaosService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ChaosService {
            inner,
            engine: Arc::clone(&self.engine),
        }
    }
}

/// Service applying chaos scenarios
#[derive(Debug, Clone)]
pub struct ChaosService<S> {
    inner: S,
    engine: Arc<ChaosEngine>,
}

impl<S> Service<Request<Body>> for ChaosService<S>
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

        let path = request.uri().path();
        if is_admin_path(path) {
            return Box::pin(inner.call(request));
        }
        let Some(action) = self.engine.should_apply_chaos(path) else {
            return Box::pin(inner.call(request));
        };

        let engine = Arc::clone(&self.engine);

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let mut exchange = request_exchange(&parts, &[]);
            let request = Request::from_parts(parts, body);

            if let Err(e) = engine.apply_chaos(&action, &mut exchange).await {
                warn!(scenario = %action.scenario, error = %e, "Chaos failed, serving normally");
                return inner.call(request).await;
            }

            let marker = ChaosMarker {
                scenario: action.scenario.clone(),
            };
            let mut response = if exchange.is_committed() {
                exchange_response(exchange)
            } else {
                inner.call(request).await?
            };
            response.extensions_mut().insert(marker);
            Ok(response)
        })
    }
}
