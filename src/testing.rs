// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Test doubles shared by unit tests

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use kube::Client;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::ConnectionError;
use crate::kubernetes::{ClientFactory, ClientProvider, ConnectionParams, SharedClient};

/// Client whose API server answers every request with the value returned by `respond`
pub fn json_client<F>(respond: F) -> Client
where
    F: Fn(&http::request::Parts) -> (StatusCode, serde_json::Value) + Send + Sync + 'static,
{
    let respond = Arc::new(respond);
    let service = tower::service_fn(move |req: Request<kube::client::Body>| {
        let respond = Arc::clone(&respond);
        async move {
            let (parts, _body) = req.into_parts();
            let (status, body) = respond(&parts);
            let response = Response::builder()
                .status(status)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(body.to_string())))
                .unwrap();
            Ok::<_, Infallible>(response)
        }
    });
    Client::new(service, "default")
}

/// Client that is never expected to talk to anything
pub fn mock_client() -> Client {
    json_client(|_| (StatusCode::NOT_FOUND, serde_json::json!({})))
}

pub fn shared_mock_client() -> SharedClient {
    Arc::new(mock_client())
}

/// Factory that counts invocations and returns a mock client
pub struct CountingFactory {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay,
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ClientFactory for CountingFactory {
    async fn create_client(&self, _params: &ConnectionParams) -> Result<Client, ConnectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(mock_client())
    }
}

/// Factory that always fails with an invalid address error
pub struct FailingFactory {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl FailingFactory {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay,
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ClientFactory for FailingFactory {
    async fn create_client(&self, _params: &ConnectionParams) -> Result<Client, ConnectionError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let address = format!("bad address #{}", attempt);
        let source = address.parse::<http::Uri>().unwrap_err();
        Err(ConnectionError::InvalidAddress {
            address,
            source: Arc::new(source),
        })
    }
}

/// Factory whose first attempt fails and later attempts succeed
pub struct FlakyFactory {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl FlakyFactory {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay,
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ClientFactory for FlakyFactory {
    async fn create_client(&self, _params: &ConnectionParams) -> Result<Client, ConnectionError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if attempt == 0 {
            return Err(ConnectionError::UnsupportedAddress {
                address: "first attempt".to_string(),
            });
        }
        Ok(mock_client())
    }
}

/// Provider that hands out a fixed client and counts how often it was asked
pub struct StaticProvider {
    client: SharedClient,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(client: SharedClient) -> Self {
        Self {
            client,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientProvider for StaticProvider {
    async fn client(&self) -> Result<SharedClient, ConnectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.client))
    }
}
