//! Agent configuration

use anyhow::Result;
use serde::Deserialize;

/// Agent configuration, loaded from PULSE_-prefixed environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Kubeconfig path override; falls back to KUBECONFIG then
    /// ~/.kube/config when unset
    #[serde(default)]
    pub kubeconfig: Option<String>,

    /// Serve fixture data when collection fails or returns nothing.
    /// When disabled, failed cluster routes return the error sentinel.
    #[serde(default = "default_mock_fallback")]
    pub mock_fallback: bool,

    /// Timeout applied to task runs that do not specify one
    #[serde(default = "default_task_timeout")]
    pub default_task_timeout_secs: u64,
}

fn default_api_port() -> u16 {
    8000
}

fn default_mock_fallback() -> bool {
    true
}

fn default_task_timeout() -> u64 {
    clusterpulse_lib::runner::DEFAULT_TIMEOUT_SECS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            kubeconfig: None,
            mock_fallback: default_mock_fallback(),
            default_task_timeout_secs: default_task_timeout(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PULSE"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
