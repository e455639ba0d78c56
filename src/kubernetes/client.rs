// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubernetes client construction
//!
//! Resolves which kubeconfig (if any) to use, builds a `kube::Config` from it and wraps
//! the resulting transport with request instrumentation.

use async_trait::async_trait;
use kube::client::ClientBuilder;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::instrument::{InstrumentLayer, PathProcessor, last_path_segment};
use crate::error::ConnectionError;

/// Timeout for connecting to K8s API
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading K8s API responses
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Client shared by every source built from one provider
pub type SharedClient = Arc<Client>;

/// Where to find the cluster and its credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Path to a kubeconfig file. Empty means "use the default location if present".
    pub kubeconfig: Option<PathBuf>,
    /// API server address, overriding the one in the kubeconfig
    pub master: Option<String>,
}

impl ConnectionParams {
    pub fn new(kubeconfig: Option<PathBuf>, master: Option<String>) -> Self {
        Self { kubeconfig, master }
    }

    fn explicit_kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    fn master(&self) -> Option<&str> {
        self.master.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// Conventional per-user kubeconfig location (~/.kube/config)
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}

/// Pick the kubeconfig to load.
///
/// An explicit path always wins, even when it does not exist. Otherwise the default
/// location is used only if the file is there.
pub fn resolve_kubeconfig_path(
    explicit: Option<&Path>,
    default: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path.to_path_buf());
    }
    default.filter(|p| p.exists())
}

/// Produces Kubernetes clients
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create_client(&self, params: &ConnectionParams) -> Result<Client, ConnectionError>;
}

/// Factory backed by kubeconfig / in-cluster configuration
#[derive(Clone, Copy)]
pub struct KubeClientFactory {
    path_processor: PathProcessor,
}

impl Default for KubeClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl KubeClientFactory {
    pub fn new() -> Self {
        Self {
            path_processor: last_path_segment,
        }
    }

    /// Use a different path-to-label mapping for request metrics
    pub fn with_path_processor(path_processor: PathProcessor) -> Self {
        Self { path_processor }
    }

    /// Build the client configuration without connecting
    pub async fn build_config(&self, params: &ConnectionParams) -> Result<Config, ConnectionError> {
        let kubeconfig_path =
            resolve_kubeconfig_path(params.explicit_kubeconfig(), default_kubeconfig_path());
        let master = params.master().map(parse_master).transpose()?;

        let mut config = match (kubeconfig_path, master) {
            (Some(path), master) => {
                debug!(kubeconfig = %path.display(), "Loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| {
                    ConnectionError::Kubeconfig {
                        path: path.clone(),
                        source: Arc::new(e),
                    }
                })?;
                let mut config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .map_err(|e| ConnectionError::Kubeconfig {
                            path: path.clone(),
                            source: Arc::new(e),
                        })?;
                if let Some(url) = master {
                    config.cluster_url = url;
                }
                config
            }
            (None, Some(url)) => {
                debug!(master = %url, "No kubeconfig, using master address only");
                Config::new(url)
            }
            (None, None) => {
                debug!("No kubeconfig, using in-cluster configuration");
                Config::incluster().map_err(|e| ConnectionError::InCluster(Arc::new(e)))?
            }
        };

        config.connect_timeout = Some(CONNECT_TIMEOUT);
        config.read_timeout = Some(READ_TIMEOUT);

        Ok(config)
    }
}

/// Parse an API server address. A bare `host[:port]` defaults to https, as kubectl does.
fn parse_master(master: &str) -> Result<http::Uri, ConnectionError> {
    let address = if master.contains("://") {
        master.to_string()
    } else {
        format!("https://{}", master)
    };

    let uri = address
        .parse::<http::Uri>()
        .map_err(|e| ConnectionError::InvalidAddress {
            address: master.to_string(),
            source: Arc::new(e),
        })?;

    let http_scheme = matches!(uri.scheme_str(), Some("http" | "https"));
    let has_host = uri.host().is_some_and(|h| !h.is_empty());
    if !http_scheme || !has_host {
        return Err(ConnectionError::UnsupportedAddress {
            address: master.to_string(),
        });
    }

    Ok(uri)
}

#[async_trait]
impl ClientFactory for KubeClientFactory {
    async fn create_client(&self, params: &ConnectionParams) -> Result<Client, ConnectionError> {
        let config = self.build_config(params).await?;
        let endpoint = config.cluster_url.to_string();

        let builder = ClientBuilder::try_from(config)
            .map_err(|e| ConnectionError::Client(Arc::new(e)))?;
        let client = builder
            .with_layer(&InstrumentLayer::new(self.path_processor))
            .build();

        info!(endpoint = %endpoint, "Connected to cluster at {}", endpoint);

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: test
  cluster:
    server: https://127.0.0.1:6443
    insecure-skip-tls-verify: true
contexts:
- name: test
  context:
    cluster: test
    user: test
    namespace: prod
current-context: test
users:
- name: test
  user:
    token: abc123
"#;

    fn write_kubeconfig(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("config");
        fs::write(&path, KUBECONFIG).unwrap();
        path
    }

    fn install_crypto_provider() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        let default = write_kubeconfig(&dir);
        let explicit = PathBuf::from("/nonexistent/kubeconfig");

        let resolved = resolve_kubeconfig_path(Some(explicit.as_path()), Some(default));
        assert_eq!(resolved, Some(explicit));
    }

    #[test]
    fn test_resolve_empty_explicit_uses_existing_default() {
        let dir = TempDir::new().unwrap();
        let default = write_kubeconfig(&dir);

        let resolved = resolve_kubeconfig_path(Some(Path::new("")), Some(default.clone()));
        assert_eq!(resolved, Some(default));
    }

    #[test]
    fn test_resolve_missing_default_is_skipped() {
        let dir = TempDir::new().unwrap();
        let default = dir.path().join("does-not-exist");

        assert_eq!(resolve_kubeconfig_path(None, Some(default)), None);
        assert_eq!(resolve_kubeconfig_path(None, None), None);
    }

    #[test]
    fn test_params_treat_blank_values_as_absent() {
        let params = ConnectionParams::new(Some(PathBuf::new()), Some("  ".to_string()));
        assert!(params.explicit_kubeconfig().is_none());
        assert!(params.master().is_none());
    }

    #[tokio::test]
    async fn test_explicit_missing_kubeconfig_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing-config");
        let params = ConnectionParams::new(Some(missing.clone()), None);

        let err = KubeClientFactory::new()
            .build_config(&params)
            .await
            .unwrap_err();
        match err {
            ConnectionError::Kubeconfig { path, .. } => assert_eq!(path, missing),
            other => panic!("Expected Kubeconfig error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_explicit_invalid_kubeconfig_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "this: [is not a kubeconfig").unwrap();

        let params = ConnectionParams::new(Some(path), None);
        let result = KubeClientFactory::new().build_config(&params).await;
        assert!(matches!(result, Err(ConnectionError::Kubeconfig { .. })));
    }

    #[tokio::test]
    async fn test_build_config_from_kubeconfig() {
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::new(Some(write_kubeconfig(&dir)), None);

        let config = KubeClientFactory::new().build_config(&params).await.unwrap();
        assert_eq!(config.cluster_url.host(), Some("127.0.0.1"));
        assert_eq!(config.cluster_url.port_u16(), Some(6443));
        assert_eq!(config.default_namespace, "prod");
        assert_eq!(config.connect_timeout, Some(CONNECT_TIMEOUT));
        assert_eq!(config.read_timeout, Some(READ_TIMEOUT));
    }

    #[tokio::test]
    async fn test_master_overrides_kubeconfig_server() {
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::new(
            Some(write_kubeconfig(&dir)),
            Some("https://10.0.0.1:8443".to_string()),
        );

        let config = KubeClientFactory::new().build_config(&params).await.unwrap();
        assert_eq!(config.cluster_url.host(), Some("10.0.0.1"));
        assert_eq!(config.cluster_url.port_u16(), Some(8443));
    }

    #[tokio::test]
    async fn test_invalid_master_fails() {
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::new(
            Some(write_kubeconfig(&dir)),
            Some("not a url".to_string()),
        );

        let result = KubeClientFactory::new().build_config(&params).await;
        match result {
            Err(ConnectionError::InvalidAddress { address, .. }) => {
                assert_eq!(address, "not a url")
            }
            other => panic!("Expected InvalidAddress error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_master_defaults_to_https() {
        let uri = parse_master("10.0.0.1:6443").unwrap();
        assert_eq!(uri.scheme_str(), Some("https"));
        assert_eq!(uri.host(), Some("10.0.0.1"));
        assert_eq!(uri.port_u16(), Some(6443));

        let uri = parse_master("localhost:8080").unwrap();
        assert_eq!(uri.scheme_str(), Some("https"));
        assert_eq!(uri.host(), Some("localhost"));
        assert_eq!(uri.port_u16(), Some(8080));

        let uri = parse_master("example.com").unwrap();
        assert_eq!(uri.scheme_str(), Some("https"));
        assert_eq!(uri.host(), Some("example.com"));
    }

    #[test]
    fn test_parse_master_keeps_explicit_scheme() {
        let uri = parse_master("http://127.0.0.1:8001").unwrap();
        assert_eq!(uri.scheme_str(), Some("http"));
        assert_eq!(uri.port_u16(), Some(8001));
    }

    #[test]
    fn test_parse_master_rejects_other_schemes() {
        match parse_master("ftp://example.com") {
            Err(ConnectionError::UnsupportedAddress { address }) => {
                assert_eq!(address, "ftp://example.com")
            }
            other => panic!("Expected UnsupportedAddress error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scheme_less_master_builds_usable_config() {
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::new(
            Some(write_kubeconfig(&dir)),
            Some("localhost:8080".to_string()),
        );
        let config = KubeClientFactory::new().build_config(&params).await.unwrap();
        assert_eq!(config.cluster_url.scheme_str(), Some("https"));
        assert_eq!(config.cluster_url.host(), Some("localhost"));
        assert_eq!(config.cluster_url.port_u16(), Some(8080));
    }

    #[tokio::test]
    async fn test_scheme_less_master_client_survives_requests() {
        install_crypto_provider();
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::new(
            Some(write_kubeconfig(&dir)),
            Some("127.0.0.1:1".to_string()),
        );

        let client = KubeClientFactory::new().create_client(&params).await.unwrap();

        // Nothing listens there; both calls must fail cleanly rather than kill the client
        assert!(client.apiserver_version().await.is_err());
        let err = client.apiserver_version().await.unwrap_err();
        assert!(!err.to_string().contains("worker closed"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_create_client_logs_endpoint() {
        install_crypto_provider();
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::new(Some(write_kubeconfig(&dir)), None);

        let client = KubeClientFactory::new().create_client(&params).await;
        assert!(client.is_ok());
        assert!(logs_contain("Connected to cluster at https://127.0.0.1:6443"));
    }
}
