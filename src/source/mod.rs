// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Endpoint sources
//!
//! A source discovers DNS endpoints from one kind of Kubernetes resource. Sources are
//! created by name through a `SourceRegistry`, all bound to the same shared client.

mod ingress;
mod registry;
mod resolver;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::kubernetes::SharedClient;

pub use ingress::{INGRESS_CLASS_ANNOTATION, IngressClass, IngressSource, InvalidNamespace};
pub use registry::{Constructor, SourceRegistry};
pub use resolver::{SourceResolver, by_names};

/// Configuration shared by every source built in one resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    /// Namespace to watch; empty means all namespaces
    pub namespace: String,
}

impl SourceConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

/// A DNS name and the addresses it should point to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub dns_name: String,
    pub targets: Vec<String>,
    /// Object the endpoint was derived from, e.g. "ingress/prod/web"
    pub resource: String,
}

/// Something that can discover endpoints
#[async_trait]
pub trait Source: Send + Sync {
    /// Registry name this source was built from
    fn name(&self) -> &str;

    /// Namespace the source is scoped to (empty for all)
    fn namespace(&self) -> &str;

    /// Client the source talks to
    fn client(&self) -> &SharedClient;

    async fn endpoints(&self) -> Result<Vec<Endpoint>, kube::Error>;
}

impl fmt::Debug for dyn Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name())
            .field("namespace", &self.namespace())
            .finish()
    }
}

/// Built-in sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    IngressNginx,
    IngressGce,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::IngressNginx, SourceKind::IngressGce];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::IngressNginx => "ingress-nginx",
            SourceKind::IngressGce => "ingress-gce",
        }
    }

    /// Constructor registered for this kind
    pub fn constructor(&self) -> Constructor {
        match self {
            SourceKind::IngressNginx => IngressSource::nginx,
            SourceKind::IngressGce => IngressSource::gce,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownSource {
                name: s.to_string(),
            })
    }
}
