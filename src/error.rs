// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Error types
//!
//! `ConnectionError` covers everything that can go wrong while building the shared
//! Kubernetes client. It is `Clone` so a failed provider can hand the same error to
//! every caller. `Error` is what source resolution returns.

use std::path::PathBuf;
use std::sync::Arc;

use kube::config::{InClusterError, KubeconfigError};
use thiserror::Error;

/// Boxed error produced by source constructors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure to resolve credentials or construct the Kubernetes client
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    #[error("failed to load kubeconfig '{}': {source}", path.display())]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: Arc<KubeconfigError>,
    },

    #[error("invalid control plane address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: Arc<http::uri::InvalidUri>,
    },

    #[error("invalid control plane address '{address}': expected an http(s) URL with a host")]
    UnsupportedAddress { address: String },

    #[error("failed to load in-cluster configuration: {0}")]
    InCluster(#[source] Arc<InClusterError>),

    #[error("failed to create Kubernetes client: {0}")]
    Client(#[source] Arc<kube::Error>),
}

/// Source resolution error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("unknown source '{name}'")]
    UnknownSource { name: String },

    #[error("failed to construct source '{name}': {source}")]
    AdapterConstruction {
        name: String,
        #[source]
        source: BoxError,
    },
}
