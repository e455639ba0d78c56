// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Request instrumentation for the Kubernetes client transport.
//!
//! `InstrumentLayer` wraps the service stack built by `kube::client::ClientBuilder`.
//! Requests and responses pass through unchanged; each call records a request counter
//! and a latency histogram labelled with the method, a reduced path and the status.

use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use http::{Request, Response};
use metrics::{counter, histogram};
use tower::{Layer, Service};
use tracing::trace;

/// Counter of requests sent to the API server
pub const REQUESTS_TOTAL: &str = "kube_client_requests_total";

/// Histogram of request latency in seconds
pub const REQUEST_DURATION_SECONDS: &str = "kube_client_request_duration_seconds";

/// Maps a request path to a metrics label
pub type PathProcessor = fn(&str) -> &str;

/// Reduce a request path to its last segment.
///
/// `/api/v1/namespaces/prod/pods` becomes `pods`. Object names end up as labels for
/// single-object requests; that is accepted for low-volume discovery traffic.
pub fn last_path_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Tower layer that observes every request made through the client
#[derive(Clone, Copy)]
pub struct InstrumentLayer {
    path_processor: PathProcessor,
}

impl InstrumentLayer {
    pub fn new(path_processor: PathProcessor) -> Self {
        Self { path_processor }
    }
}

impl Default for InstrumentLayer {
    fn default() -> Self {
        Self::new(last_path_segment)
    }
}

impl<S> Layer<S> for InstrumentLayer {
    type Service = InstrumentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentService {
            inner,
            path_processor: self.path_processor,
        }
    }
}

/// Service produced by `InstrumentLayer`
#[derive(Clone)]
pub struct InstrumentService<S> {
    inner: S,
    path_processor: PathProcessor,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for InstrumentService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let path = (self.path_processor)(req.uri().path()).to_string();
        let method = req.method().as_str().to_string();
        let start = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;
            let status = match &result {
                Ok(response) => response.status().as_str().to_string(),
                Err(_) => "error".to_string(),
            };
            let elapsed = start.elapsed();

            trace!(
                method = %method,
                path = %path,
                status = %status,
                elapsed_ms = elapsed.as_millis() as u64,
                "API request"
            );

            counter!(
                REQUESTS_TOTAL,
                "method" => method.clone(),
                "path" => path.clone(),
                "status" => status
            )
            .increment(1);
            histogram!(
                REQUEST_DURATION_SECONDS,
                "method" => method,
                "path" => path
            )
            .record(elapsed.as_secs_f64());

            result
        })
    }
}
