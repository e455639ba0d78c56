// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubernetes client construction and sharing

mod client;
pub mod instrument;
mod provider;

pub use client::{
    ClientFactory, ConnectionParams, KubeClientFactory, SharedClient, default_kubeconfig_path,
    resolve_kubeconfig_path,
};
pub use instrument::{InstrumentLayer, last_path_segment};
pub use provider::{ClientProvider, FailurePolicy, SingletonClientProvider};
