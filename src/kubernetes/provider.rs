// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Lazily constructed, process-shared Kubernetes client
//!
//! `SingletonClientProvider` runs the client factory at most once per provider (per
//! attempt, see `FailurePolicy`) no matter how many tasks ask for the client at the
//! same time. Callers that arrive while construction is in progress wait for it and
//! observe the same outcome.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::client::{ClientFactory, ConnectionParams, KubeClientFactory, SharedClient};
use crate::error::ConnectionError;

/// Anything that can hand out the shared client
#[async_trait]
pub trait ClientProvider: Send + Sync {
    async fn client(&self) -> Result<SharedClient, ConnectionError>;
}

/// What happens to later callers after construction failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The provider stays failed and keeps returning the original error
    #[default]
    Sticky,
    /// Callers that waited on the failed attempt get its error; the next caller retries
    RetryOnNextCall,
}

enum State {
    Uninitialized,
    Initializing,
    Ready(SharedClient),
    Failed(ConnectionError),
}

struct Inner {
    state: State,
    /// Number of the latest construction attempt
    attempt: u64,
    /// Most recent failure and the attempt that produced it
    last_failure: Option<(u64, ConnectionError)>,
}

/// Generates the client on first use and memoizes it
pub struct SingletonClientProvider<F = KubeClientFactory> {
    params: ConnectionParams,
    factory: F,
    policy: FailurePolicy,
    /// Set once construction succeeded; read without locking
    ready: OnceLock<SharedClient>,
    inner: Mutex<Inner>,
    /// Wakes callers waiting on an in-flight initialization
    settled: Notify,
}

impl SingletonClientProvider<KubeClientFactory> {
    pub fn new(params: ConnectionParams) -> Self {
        Self::with_factory(params, KubeClientFactory::new())
    }
}

impl<F: ClientFactory> SingletonClientProvider<F> {
    pub fn with_factory(params: ConnectionParams, factory: F) -> Self {
        Self {
            params,
            factory,
            policy: FailurePolicy::default(),
            ready: OnceLock::new(),
            inner: Mutex::new(Inner {
                state: State::Uninitialized,
                attempt: 0,
                last_failure: None,
            }),
            settled: Notify::new(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Get the client, constructing it if nobody has yet
    pub async fn get_client(&self) -> Result<SharedClient, ConnectionError> {
        if let Some(client) = self.ready.get() {
            return Ok(Arc::clone(client));
        }

        let attempt = loop {
            let (settled, awaited) = {
                let mut inner = self.inner.lock();
                match &inner.state {
                    State::Ready(client) => return Ok(Arc::clone(client)),
                    State::Failed(err) if self.policy == FailurePolicy::Sticky => {
                        return Err(err.clone());
                    }
                    State::Initializing => {
                        // Registered under the lock so the wakeup cannot be missed
                        (self.settled.notified(), inner.attempt)
                    }
                    State::Uninitialized | State::Failed(_) => {
                        inner.attempt += 1;
                        inner.state = State::Initializing;
                        break inner.attempt;
                    }
                }
            };
            settled.await;

            // A waiter gets the outcome of the attempt it waited on, even if a fresh
            // caller has already started another one.
            let inner = self.inner.lock();
            if let Some((failed, err)) = &inner.last_failure
                && *failed == awaited
            {
                return Err(err.clone());
            }
            if let State::Ready(client) = &inner.state {
                return Ok(Arc::clone(client));
            }
            // Abandoned attempt: go around and take over or wait again
        };

        self.initialize(attempt).await
    }

    async fn initialize(&self, attempt: u64) -> Result<SharedClient, ConnectionError> {
        let mut guard = InitGuard {
            provider: self,
            armed: true,
        };

        debug!(attempt, "Creating Kubernetes client");
        let result = self
            .factory
            .create_client(&self.params)
            .await
            .map(Arc::new);

        guard.armed = false;
        {
            let mut inner = self.inner.lock();
            match &result {
                Ok(client) => {
                    let _ = self.ready.set(Arc::clone(client));
                    inner.state = State::Ready(Arc::clone(client));
                }
                Err(err) => {
                    warn!(error = %err, attempt, "Failed to create Kubernetes client");
                    inner.last_failure = Some((attempt, err.clone()));
                    inner.state = State::Failed(err.clone());
                }
            }
        }
        self.settled.notify_waiters();

        result
    }
}

/// Resets an abandoned initialization so a waiting caller can take over
struct InitGuard<'a, F> {
    provider: &'a SingletonClientProvider<F>,
    armed: bool,
}

impl<F> Drop for InitGuard<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            self.provider.inner.lock().state = State::Uninitialized;
            self.provider.settled.notify_waiters();
        }
    }
}

#[async_trait]
impl<F: ClientFactory> ClientProvider for SingletonClientProvider<F> {
    async fn client(&self) -> Result<SharedClient, ConnectionError> {
        self.get_client().await
    }
}
