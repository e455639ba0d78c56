// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Rendering discovered endpoints

mod json;
mod table;

pub use json::JsonFormatter;
pub use table::TableFormatter;

use kube_sources::source::Endpoint;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Endpoints found by one source
#[derive(Debug, Clone, Serialize)]
pub struct SourceEndpoints {
    pub source: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    pub sources: Vec<SourceEndpoints>,
}

impl DiscoveryResult {
    pub fn format(&self, format: &OutputFormat, no_headers: bool) -> String {
        match format {
            OutputFormat::Table => TableFormatter::format(self, no_headers),
            OutputFormat::Json => JsonFormatter::format(self),
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.sources.iter().map(|s| s.endpoints.len()).sum()
    }
}
