// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Shared Kubernetes client and name-resolved endpoint sources.
//!
//! A `SingletonClientProvider` builds one instrumented `kube::Client` on first use and
//! hands it to every caller. `source::by_names` turns a list of source names into
//! sources bound to that client and a namespace, all or nothing.

pub mod config;
pub mod error;
pub mod kubernetes;
pub mod source;

#[cfg(test)]
mod testing;

pub use error::{BoxError, ConnectionError, Error, Result};
pub use kubernetes::{
    ClientFactory, ClientProvider, ConnectionParams, FailurePolicy, KubeClientFactory,
    SharedClient, SingletonClientProvider,
};
pub use source::{Endpoint, Source, SourceConfig, SourceKind, SourceRegistry, SourceResolver};
