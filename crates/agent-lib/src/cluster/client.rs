//! Control-plane session management
//!
//! The session handle is established lazily on first use and cached for the
//! process lifetime. Acquisition tries an ordered pair of credential
//! sources: a kubeconfig file (for operators) and the in-cluster service
//! account (for workloads running inside the managed environment).

use super::ClusterError;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Owns the connection to the control plane.
///
/// `acquire` is idempotent and safe to call concurrently: the first caller
/// performs initialization while the rest wait and observe the same handle.
/// A failed attempt is not cached, so a later call retries from scratch.
pub struct ClusterClient {
    kubeconfig_path: PathBuf,
    session: OnceCell<Client>,
}

impl ClusterClient {
    /// Create a client; `kubeconfig` overrides the default path resolution
    /// (KUBECONFIG env var, then `~/.kube/config`).
    pub fn new(kubeconfig: Option<&Path>) -> Self {
        Self {
            kubeconfig_path: resolve_kubeconfig_path(kubeconfig),
            session: OnceCell::new(),
        }
    }

    pub fn kubeconfig_path(&self) -> &Path {
        &self.kubeconfig_path
    }

    /// Get the shared session handle, establishing it on first use.
    pub async fn acquire(&self) -> Result<&Client, ClusterError> {
        self.session.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<Client, ClusterError> {
        info!(path = %self.kubeconfig_path.display(), "Loading kubeconfig");
        let kubeconfig_err = match self.session_from_kubeconfig().await {
            Ok(client) => {
                info!("Control plane session established from kubeconfig");
                return Ok(client);
            }
            Err(err) => {
                warn!(error = %err, "Failed to load kubeconfig, trying in-cluster config");
                err
            }
        };

        match Self::session_from_incluster().await {
            Ok(client) => {
                info!("Control plane session established from in-cluster config");
                Ok(client)
            }
            Err(incluster_err) => Err(ClusterError::SessionUnavailable {
                kubeconfig: kubeconfig_err.to_string(),
                in_cluster: incluster_err.to_string(),
            }),
        }
    }

    async fn session_from_kubeconfig(&self) -> anyhow::Result<Client> {
        let kubeconfig = Kubeconfig::read_from(&self.kubeconfig_path)?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        Ok(Client::try_from(config)?)
    }

    async fn session_from_incluster() -> anyhow::Result<Client> {
        let config = Config::incluster()?;
        Ok(Client::try_from(config)?)
    }
}

fn resolve_kubeconfig_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("KUBECONFIG") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs_next::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .unwrap_or_else(|| PathBuf::from(".kube/config"))
}
