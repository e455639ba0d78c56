// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Name → constructor table for sources

use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use super::{Source, SourceKind};
use crate::error::{BoxError, Error, Result};
use crate::kubernetes::SharedClient;

/// Builds a source bound to a client and namespace
pub type Constructor = fn(SharedClient, &str) -> Result<Box<dyn Source>, BoxError>;

static BUILTIN: LazyLock<SourceRegistry> = LazyLock::new(|| {
    SourceKind::ALL
        .into_iter()
        .fold(SourceRegistry::new(), |registry, kind| {
            registry.register(kind.as_str(), kind.constructor())
        })
});

/// Registry of source constructors keyed by source name
#[derive(Clone, Default)]
pub struct SourceRegistry {
    constructors: HashMap<String, Constructor>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in sources. Immutable once first accessed.
    pub fn builtin() -> &'static SourceRegistry {
        &BUILTIN
    }

    /// Add (or replace) a constructor
    pub fn register(mut self, name: impl Into<String>, constructor: Constructor) -> Self {
        self.constructors.insert(name.into(), constructor);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the source registered under `name`
    pub fn resolve(
        &self,
        name: &str,
        client: &SharedClient,
        namespace: &str,
    ) -> Result<Box<dyn Source>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::UnknownSource {
                name: name.to_string(),
            })?;

        let source = constructor(SharedClient::clone(client), namespace).map_err(|source| {
            Error::AdapterConstruction {
                name: name.to_string(),
                source,
            }
        })?;

        debug!(source = %name, namespace = %namespace, "Constructed source");
        Ok(source)
    }
}
