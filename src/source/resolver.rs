// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resolve a list of source names into sources sharing one client

use tracing::debug;

use super::{Source, SourceConfig, SourceRegistry};
use crate::error::Result;
use crate::kubernetes::ClientProvider;

/// Resolves source names against a registry
#[derive(Clone, Copy)]
pub struct SourceResolver<'a> {
    registry: &'a SourceRegistry,
}

impl SourceResolver<'static> {
    /// Resolver over the built-in sources
    pub fn builtin() -> Self {
        Self::new(SourceRegistry::builtin())
    }
}

impl<'a> SourceResolver<'a> {
    pub fn new(registry: &'a SourceRegistry) -> Self {
        Self { registry }
    }

    /// Build one source per name, in order.
    ///
    /// The client is fetched once, and only if there is at least one name. The first
    /// failure aborts the whole resolution; no partial list is returned.
    pub async fn resolve_all<P, S>(
        &self,
        names: &[S],
        provider: &P,
        config: &SourceConfig,
    ) -> Result<Vec<Box<dyn Source>>>
    where
        P: ClientProvider + ?Sized,
        S: AsRef<str>,
    {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let client = provider.client().await?;

        let sources = names
            .iter()
            .map(|name| {
                self.registry
                    .resolve(name.as_ref(), &client, &config.namespace)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            count = sources.len(),
            namespace = %config.namespace,
            "Resolved sources"
        );

        Ok(sources)
    }
}

/// Resolve names against the built-in registry
pub async fn by_names<P, S>(
    names: &[S],
    provider: &P,
    config: &SourceConfig,
) -> Result<Vec<Box<dyn Source>>>
where
    P: ClientProvider + ?Sized,
    S: AsRef<str>,
{
    SourceResolver::builtin()
        .resolve_all(names, provider, config)
        .await
}
