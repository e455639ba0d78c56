// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Persisted defaults for kube-sources
//!
//! All kube-sources data is stored under ~/.kube-sources/:
//! - ~/.kube-sources/config.json - default sources and namespace
//! - ~/.kube-sources/log/ - log files

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the base kube-sources directory (~/.kube-sources/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".kube-sources"))
        .context("Could not determine home directory")
}

/// kube-sources configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sources used when none are given on the command line
    #[serde(default)]
    pub sources: Vec<String>,

    /// Namespace used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Config {
    /// Load config from the default location, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, or return default if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the config file path (~/.kube-sources/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }

    /// Remember a source selection as the new defaults and write it to `path`.
    /// An empty namespace is stored as "all namespaces".
    pub fn set_defaults(
        &mut self,
        sources: Vec<String>,
        namespace: &str,
        path: &Path,
    ) -> Result<()> {
        self.sources = sources;
        self.namespace = Some(namespace.to_string()).filter(|ns| !ns.is_empty());
        self.save_to(path)
    }

    /// Sources to resolve: command line wins when non-empty.
    /// Comma-separated entries are split and blanks dropped.
    pub fn effective_sources(&self, cli: &[String]) -> Vec<String> {
        let chosen: &[String] = if cli.is_empty() { &self.sources } else { cli };
        chosen
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Namespace to use: command line wins, then the file, then all namespaces
    pub fn effective_namespace(&self, cli: Option<&str>) -> String {
        cli.or(self.namespace.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}
