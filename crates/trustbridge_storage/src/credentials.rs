use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::warn;
use trustbridge_contract::{Credentials, UserProfile};

use crate::repository::TrustBridgeStorage;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";
pub const CONNECTED_WALLET_KEY: &str = "connectedWallet";

const AUTH_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

pub type AuthHeaders = BTreeMap<String, String>;

/// Persisted session state: tokens, user profile and the remembered wallet.
///
/// A detached store has no backing storage. Every read yields `None` and
/// every write is dropped, which is how headless callers run without a
/// session.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    storage: Option<TrustBridgeStorage>,
}

impl CredentialStore {
    pub fn new(storage: TrustBridgeStorage) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub fn detached() -> Self {
        Self { storage: None }
    }

    pub fn is_detached(&self) -> bool {
        self.storage.is_none()
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.read(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.read(REFRESH_TOKEN_KEY).await
    }

    pub async fn user(&self) -> Result<Option<UserProfile>> {
        let Some(raw) = self.read(USER_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(error) => {
                warn!(error = %error, "stored user profile is unreadable");
                Ok(None)
            }
        }
    }

    pub async fn credentials(&self) -> Result<Option<Credentials>> {
        let (Some(access_token), Some(user)) = (self.access_token().await?, self.user().await?)
        else {
            return Ok(None);
        };
        Ok(Some(Credentials {
            access_token,
            refresh_token: self.refresh_token().await?,
            user,
        }))
    }

    /// Stores the access token, and the refresh token when one is given.
    pub async fn set_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        self.write(ACCESS_TOKEN_KEY, access_token).await?;
        if let Some(refresh) = refresh_token {
            self.write(REFRESH_TOKEN_KEY, refresh).await?;
        }
        Ok(())
    }

    pub async fn set_user(&self, user: &UserProfile) -> Result<()> {
        let serialized = serde_json::to_string(user).context("serialize user profile")?;
        self.write(USER_KEY, &serialized).await
    }

    pub async fn clear_auth(&self) -> Result<()> {
        if let Some(storage) = &self.storage {
            storage.delete_values(&AUTH_KEYS).await?;
        }
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token().await?.is_some_and(|token| !token.is_empty()))
    }

    /// `Authorization` header for outbound calls; empty when signed out.
    pub async fn auth_headers(&self) -> Result<AuthHeaders> {
        let mut headers = AuthHeaders::new();
        if let Some(token) = self.access_token().await?.filter(|token| !token.is_empty()) {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        Ok(headers)
    }

    pub async fn remembered_wallet(&self) -> Result<Option<String>> {
        self.read(CONNECTED_WALLET_KEY).await
    }

    pub async fn remember_wallet(&self, provider: &str) -> Result<()> {
        self.write(CONNECTED_WALLET_KEY, provider).await
    }

    pub async fn forget_wallet(&self) -> Result<()> {
        if let Some(storage) = &self.storage {
            storage.delete_value(CONNECTED_WALLET_KEY).await?;
        }
        Ok(())
    }

    /// Logout plus wallet disconnect: drops every persisted key.
    pub async fn clear_all(&self) -> Result<()> {
        self.clear_auth().await?;
        self.forget_wallet().await
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        match &self.storage {
            Some(storage) => storage.get_value(key).await,
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        match &self.storage {
            Some(storage) => storage.put_value(key, value).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialStore, USER_KEY};
    use crate::repository::{StorageConfig, TrustBridgeStorage};
    use trustbridge_contract::UserProfile;

    async fn store() -> (CredentialStore, TrustBridgeStorage) {
        let storage = TrustBridgeStorage::connect(&StorageConfig::in_memory())
            .await
            .expect("connect");
        (CredentialStore::new(storage.clone()), storage)
    }

    fn user() -> UserProfile {
        serde_json::from_value(serde_json::json!({
            "id": "user_1",
            "whatsappNumber": "+6281234567890",
            "status": "active"
        }))
        .expect("user")
    }

    #[tokio::test]
    async fn tokens_drive_authentication_and_headers() {
        let (store, _) = store().await;
        assert!(!store.is_authenticated().await.expect("auth"));
        assert!(store.auth_headers().await.expect("headers").is_empty());

        store.set_tokens("x", None).await.expect("set");
        assert!(store.is_authenticated().await.expect("auth"));
        let headers = store.auth_headers().await.expect("headers");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer x"));
        assert_eq!(store.refresh_token().await.expect("refresh"), None);
    }

    #[tokio::test]
    async fn clear_auth_is_idempotent_and_keeps_wallet() {
        let (store, _) = store().await;
        store.set_tokens("a", Some("r")).await.expect("set");
        store.set_user(&user()).await.expect("user");
        store.remember_wallet("nami").await.expect("wallet");

        store.clear_auth().await.expect("clear");
        store.clear_auth().await.expect("clear again");

        assert!(!store.is_authenticated().await.expect("auth"));
        assert_eq!(store.user().await.expect("user"), None);
        assert_eq!(store.refresh_token().await.expect("refresh"), None);
        assert_eq!(
            store.remembered_wallet().await.expect("wallet").as_deref(),
            Some("nami")
        );

        store.clear_all().await.expect("clear all");
        assert_eq!(store.remembered_wallet().await.expect("wallet"), None);
    }

    #[tokio::test]
    async fn credentials_combine_tokens_and_user() {
        let (store, _) = store().await;
        assert_eq!(store.credentials().await.expect("creds"), None);

        store.set_tokens("a", Some("r")).await.expect("set");
        store.set_user(&user()).await.expect("user");
        let creds = store.credentials().await.expect("creds").expect("present");
        assert_eq!(creds.access_token, "a");
        assert_eq!(creds.refresh_token.as_deref(), Some("r"));
        assert_eq!(creds.user.id, "user_1");
    }

    #[tokio::test]
    async fn corrupt_user_reads_as_absent() {
        let (store, storage) = store().await;
        storage.put_value(USER_KEY, "{not json").await.expect("put");
        assert_eq!(store.user().await.expect("user"), None);
    }

    #[tokio::test]
    async fn detached_store_ignores_writes() {
        let store = CredentialStore::detached();
        store.set_tokens("x", Some("y")).await.expect("set");
        assert!(store.is_detached());
        assert!(!store.is_authenticated().await.expect("auth"));
        assert!(store.auth_headers().await.expect("headers").is_empty());
        store.clear_auth().await.expect("clear");
    }
}
