use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use trustbridge_client::{ClientConfig, ContextSettings};
use trustbridge_mock::MockLatency;
use trustbridge_proxy::ProxyConfig;
use trustbridge_storage::StorageConfig;
use url::Url;

pub const BACKEND_URL_ENV: &str = "TRUSTBRIDGE_BACKEND_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub backend: BackendSection,
    pub storage: StorageSection,
    pub proxy: ProxySection,
    pub mock: MockSection,
    pub wallet: WalletSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: trustbridge_client::DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: trustbridge_client::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub sqlite_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            sqlite_path: "trustbridge.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxySection {
    pub bind: String,
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockSection {
    pub simulate_latency: bool,
}

impl Default for MockSection {
    fn default() -> Self {
        Self {
            simulate_latency: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletSection {
    pub refresh_interval_secs: u64,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            refresh_interval_secs: trustbridge_wallet::DEFAULT_REFRESH_INTERVAL.as_secs(),
        }
    }
}

impl RuntimeConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&source)
            .with_context(|| format!("invalid config TOML at {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.backend.base_url = url;
        }
        self
    }

    pub fn backend_url(&self) -> Result<Url> {
        Url::parse(&self.backend.base_url)
            .with_context(|| format!("invalid backend URL {}", self.backend.base_url))
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            base_url: self.backend_url()?,
            timeout: Duration::from_secs(self.backend.timeout_secs),
        })
    }

    pub fn proxy_config(&self) -> Result<ProxyConfig> {
        Ok(ProxyConfig {
            backend_url: self.backend_url()?,
            timeout: trustbridge_proxy::DEFAULT_UPSTREAM_TIMEOUT,
        })
    }

    pub fn context_settings(&self, detached: bool) -> Result<ContextSettings> {
        Ok(ContextSettings {
            client: self.client_config()?,
            storage: (!detached).then(|| StorageConfig {
                sqlite_path: self.storage.sqlite_path.clone(),
            }),
            latency: if self.mock.simulate_latency {
                MockLatency::Simulated
            } else {
                MockLatency::Disabled
            },
        })
    }

    pub fn wallet_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.wallet.refresh_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use trustbridge_mock::MockLatency;

    use super::{RuntimeConfig, BACKEND_URL_ENV};

    #[test]
    fn missing_sections_take_defaults() {
        let config = RuntimeConfig::parse(
            r#"
            [backend]
            base_url = "https://api.trustbridge.example"

            [mock]
            simulate_latency = false
            "#,
        )
        .expect("config");

        assert_eq!(config.backend.base_url, "https://api.trustbridge.example");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.storage.sqlite_path, "trustbridge.db");
        assert_eq!(config.proxy.bind, "127.0.0.1:3000");
        assert_eq!(config.wallet_refresh_interval(), Duration::from_secs(30));

        let settings = config.context_settings(false).expect("settings");
        assert_eq!(settings.latency, MockLatency::Disabled);
        assert_eq!(
            settings.storage.map(|storage| storage.sqlite_path).as_deref(),
            Some("trustbridge.db")
        );
    }

    #[test]
    fn environment_overrides_backend_url() {
        let config = RuntimeConfig::default().with_env(|key| {
            (key == BACKEND_URL_ENV).then(|| "http://10.0.0.5:5000".to_string())
        });
        assert_eq!(
            config.client_config().expect("client").base_url.as_str(),
            "http://10.0.0.5:5000/"
        );

        let untouched = RuntimeConfig::default().with_env(|_| Some("  ".to_string()));
        assert_eq!(untouched.backend.base_url, "http://localhost:5000");
    }

    #[test]
    fn absent_file_is_not_an_error() {
        let config =
            RuntimeConfig::load(Path::new("does/not/exist/trustbridge.toml")).expect("defaults");
        assert!(config.mock.simulate_latency);
        assert!(config.context_settings(true).expect("settings").storage.is_none());
    }

    #[test]
    fn rejects_malformed_backend_url() {
        let config = RuntimeConfig::parse("[backend]\nbase_url = \"not a url\"").expect("config");
        assert!(config.client_config().is_err());
    }
}
