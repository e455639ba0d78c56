// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::prelude::*;

use cli::Args;
use kube_sources::config::{self, Config};
use kube_sources::{ConnectionParams, SingletonClientProvider, SourceConfig, SourceRegistry};
use output::{DiscoveryResult, SourceEndpoints};

/// Initialize logging with file output and optional stderr
fn init_logging(verbose: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};
    use tracing_subscriber::fmt::format::FmtSpan;

    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return;
    }

    // Rotate daily or at 10MB, keeping 5 files
    let log_path = log_dir.join("kube-sources.log");
    let condition = RollingConditionBase::new()
        .daily()
        .max_size(10 * 1024 * 1024);

    let file_appender = match RollingFileAppenderBase::new(log_path, condition, 5) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = file_appender.get_non_blocking_appender();
    // Leak the guard to keep the background writer alive
    std::mem::forget(guard);

    let filter = if verbose {
        "kube_sources=debug"
    } else {
        "kube_sources=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE);

    if verbose {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (aws-lc-rs)
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_sources {
        for name in SourceRegistry::builtin().names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut file_config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    let names = file_config.effective_sources(&args.sources);
    if names.is_empty() {
        anyhow::bail!(
            "No sources given. Use --source with one of: {}",
            SourceRegistry::builtin().names().join(", ")
        );
    }
    let source_config = SourceConfig::new(file_config.effective_namespace(args.namespace.as_deref()));

    if args.save {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        file_config.set_defaults(names.clone(), &source_config.namespace, &path)?;
        info!(path = %path.display(), "Saved default sources");
    }

    let provider = SingletonClientProvider::new(ConnectionParams::new(
        args.kubeconfig.clone(),
        args.master.clone(),
    ));

    let sources = kube_sources::source::by_names(names.as_slice(), &provider, &source_config)
        .await
        .context("Failed to set up sources")?;

    info!(
        sources = %names.join(","),
        namespace = %source_config.namespace,
        "Sources ready"
    );

    let mut result = DiscoveryResult::default();
    for source in &sources {
        let endpoints = source
            .endpoints()
            .await
            .with_context(|| format!("Source '{}' failed to list endpoints", source.name()))?;
        result.sources.push(SourceEndpoints {
            source: source.name().to_string(),
            endpoints,
        });
    }

    println!("{}", result.format(&args.output, args.no_headers));

    Ok(())
}
