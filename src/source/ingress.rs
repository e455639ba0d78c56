// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Ingress-backed sources for the nginx and GCE ingress controllers.

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::Api;
use kube::api::ListParams;
use thiserror::Error;
use tracing::{debug, trace};

use super::{Endpoint, Source, SourceKind};
use crate::error::BoxError;
use crate::kubernetes::SharedClient;

/// Legacy annotation selecting the ingress controller
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

/// Maximum length of a namespace name (RFC 1123 label)
const MAX_NAMESPACE_LEN: usize = 63;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid namespace '{0}': must be a lowercase RFC 1123 label")]
pub struct InvalidNamespace(pub String);

/// Ingress controller a source watches for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressClass {
    Nginx,
    Gce,
}

impl IngressClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngressClass::Nginx => "nginx",
            IngressClass::Gce => "gce",
        }
    }

    fn kind(&self) -> SourceKind {
        match self {
            IngressClass::Nginx => SourceKind::IngressNginx,
            IngressClass::Gce => SourceKind::IngressGce,
        }
    }

    /// Whether an ingress with the given class belongs to this controller.
    /// The GCE controller also claims ingresses that name no class.
    pub fn matches(&self, class: Option<&str>) -> bool {
        match (self, class) {
            (_, Some(class)) => class == self.as_str(),
            (IngressClass::Gce, None) => true,
            (IngressClass::Nginx, None) => false,
        }
    }
}

/// Discovers endpoints from Ingress rules
pub struct IngressSource {
    client: SharedClient,
    namespace: String,
    class: IngressClass,
}

impl IngressSource {
    pub fn new(
        client: SharedClient,
        namespace: &str,
        class: IngressClass,
    ) -> Result<Self, InvalidNamespace> {
        validate_namespace(namespace)?;
        Ok(Self {
            client,
            namespace: namespace.to_string(),
            class,
        })
    }

    /// Registry constructor for "ingress-nginx"
    pub fn nginx(client: SharedClient, namespace: &str) -> Result<Box<dyn Source>, BoxError> {
        Ok(Box::new(Self::new(client, namespace, IngressClass::Nginx)?))
    }

    /// Registry constructor for "ingress-gce"
    pub fn gce(client: SharedClient, namespace: &str) -> Result<Box<dyn Source>, BoxError> {
        Ok(Box::new(Self::new(client, namespace, IngressClass::Gce)?))
    }

    fn api(&self) -> Api<Ingress> {
        let client = (*self.client).clone();
        if self.namespace.is_empty() {
            Api::all(client)
        } else {
            Api::namespaced(client, &self.namespace)
        }
    }
}

#[async_trait]
impl Source for IngressSource {
    fn name(&self) -> &str {
        self.class.kind().as_str()
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn client(&self) -> &SharedClient {
        &self.client
    }

    async fn endpoints(&self) -> Result<Vec<Endpoint>, kube::Error> {
        let list = self.api().list(&ListParams::default()).await?;

        let endpoints: Vec<Endpoint> = list
            .items
            .iter()
            .filter(|ing| self.class.matches(ingress_class(ing)))
            .flat_map(endpoints_for)
            .collect();

        debug!(
            source = %self.name(),
            namespace = %self.namespace,
            ingresses = list.items.len(),
            endpoints = endpoints.len(),
            "Discovered ingress endpoints"
        );

        Ok(endpoints)
    }
}

/// Check a namespace is empty (all namespaces) or a valid RFC 1123 label
fn validate_namespace(namespace: &str) -> Result<(), InvalidNamespace> {
    if namespace.is_empty() {
        return Ok(());
    }

    let bytes = namespace.as_bytes();
    let valid_char = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-';
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    let valid = bytes.len() <= MAX_NAMESPACE_LEN
        && bytes.iter().all(valid_char)
        && bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum);

    if valid {
        Ok(())
    } else {
        Err(InvalidNamespace(namespace.to_string()))
    }
}

/// Class from `spec.ingressClassName`, falling back to the legacy annotation
fn ingress_class(ingress: &Ingress) -> Option<&str> {
    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.ingress_class_name.as_deref())
        .or_else(|| {
            ingress
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(INGRESS_CLASS_ANNOTATION))
                .map(String::as_str)
        })
}

/// Load balancer addresses published in the ingress status
fn targets(ingress: &Ingress) -> Vec<String> {
    ingress
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.ip.clone().or_else(|| e.hostname.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn endpoints_for(ingress: &Ingress) -> Vec<Endpoint> {
    let resource = format!(
        "ingress/{}/{}",
        ingress.metadata.namespace.as_deref().unwrap_or_default(),
        ingress.metadata.name.as_deref().unwrap_or_default()
    );

    let targets = targets(ingress);
    if targets.is_empty() {
        trace!(resource = %resource, "Ingress has no load balancer address yet");
        return Vec::new();
    }

    ingress
        .spec
        .iter()
        .flat_map(|spec| spec.rules.iter().flatten())
        .filter_map(|rule| rule.host.as_deref())
        .filter(|host| !host.is_empty())
        .map(|host| Endpoint {
            dns_name: host.to_string(),
            targets: targets.clone(),
            resource: resource.clone(),
        })
        .collect()
}
