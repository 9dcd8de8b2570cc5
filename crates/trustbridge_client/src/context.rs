use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use trustbridge_mock::{MockApiService, MockLatency};
use trustbridge_storage::{CredentialStore, StorageConfig, TrustBridgeStorage};

use crate::auth::AuthService;
use crate::client::{ApiClient, ClientConfig};

#[derive(Debug, Clone)]
pub struct ContextSettings {
    pub client: ClientConfig,
    /// `None` runs without persisted credentials.
    pub storage: Option<StorageConfig>,
    pub latency: MockLatency,
}

/// Shared services built once at startup and handed to every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    storage: Option<TrustBridgeStorage>,
    credentials: CredentialStore,
    api: Arc<ApiClient>,
    auth: AuthService,
}

impl AppContext {
    pub async fn connect(settings: ContextSettings) -> Result<Self> {
        let storage = match &settings.storage {
            Some(config) => Some(
                TrustBridgeStorage::connect(config)
                    .await
                    .with_context(|| format!("failed to open storage at {}", config.sqlite_path))?,
            ),
            None => None,
        };
        let mock = MockApiService::new(settings.latency);
        let context = Self::from_parts(settings.client, storage, mock)?;
        info!(
            backend = %context.api.config().base_url,
            detached = context.credentials.is_detached(),
            "application context ready"
        );
        Ok(context)
    }

    pub fn from_parts(
        client: ClientConfig,
        storage: Option<TrustBridgeStorage>,
        mock: MockApiService,
    ) -> Result<Self> {
        let credentials = storage
            .clone()
            .map(CredentialStore::new)
            .unwrap_or_else(CredentialStore::detached);
        let api = ApiClient::new(client, credentials.clone(), mock)
            .context("failed to build API client")?;
        let api = Arc::new(api);
        let auth = AuthService::new(api.clone());

        Ok(Self {
            storage,
            credentials,
            api,
            auth,
        })
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn storage(&self) -> Option<&TrustBridgeStorage> {
        self.storage.as_ref()
    }

    pub async fn shutdown(&self) {
        if let Some(storage) = &self.storage {
            storage.pool().close().await;
        }
    }
}
