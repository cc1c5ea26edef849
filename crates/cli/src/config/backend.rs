//! Backend Config

use std::time::Duration;

use clap::Args;
use inkvault_app::backend::BackendConfig;

/// Managed backend connection settings.
#[derive(Debug, Args)]
pub(crate) struct BackendArgs {
    /// Backend project URL
    #[arg(long = "backend-url", env = "INKVAULT_BACKEND_URL")]
    pub url: String,

    /// Public anonymous API key
    #[arg(long, env = "INKVAULT_ANON_KEY", hide_env_values = true)]
    pub anon_key: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "INKVAULT_TIMEOUT_SECONDS", default_value_t = 15)]
    pub timeout_seconds: u64,
}

impl BackendArgs {
    pub(crate) fn to_config(&self) -> BackendConfig {
        BackendConfig {
            url: self.url.clone(),
            anon_key: self.anon_key.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}
