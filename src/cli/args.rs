// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kube-sources")]
#[command(author, version, about = "Discover DNS endpoints from Kubernetes ingresses")]
pub struct Args {
    /// Sources to resolve, in order of precedence. Repeatable or comma-separated.
    /// Examples: -s ingress-nginx, -s "ingress-nginx,ingress-gce"
    #[arg(short, long = "source", value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Namespace to watch (default: all namespaces)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Path to a kubeconfig file (default: ~/.kube/config if present, else in-cluster)
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubernetes API server address, overriding the kubeconfig
    #[arg(long, value_name = "URL")]
    pub master: Option<String>,

    /// Read defaults from this config file instead of ~/.kube-sources/config.json
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Omit column headers in output
    #[arg(long)]
    pub no_headers: bool,

    /// Save the chosen sources and namespace as the new defaults
    #[arg(long)]
    pub save: bool,

    /// List the registered source names and exit
    #[arg(long)]
    pub list_sources: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
