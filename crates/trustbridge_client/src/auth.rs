use std::sync::Arc;

use reqwest::Method;
use tracing::{info, warn};
use trustbridge_contract::{
    compose_phone_number, Fetched, LoginPayload, LoginRequest, LoginResult, UserProfile,
};
use trustbridge_storage::CredentialStore;

use crate::client::ApiClient;
use crate::error::ClientError;

/// Signs the user in against the backend and keeps the session in the
/// credential store.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
    credentials: CredentialStore,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        let credentials = client.credentials().clone();
        Self {
            client,
            credentials,
        }
    }

    /// Logs in with a local number and a country code.
    ///
    /// Backend failures are absorbed by a demo login. Only a failure to
    /// persist the resulting session is returned as an error.
    pub async fn login(
        &self,
        identifier: &str,
        country_code: &str,
    ) -> Result<Fetched<LoginResult>, ClientError> {
        let body = LoginRequest {
            whatsapp_number: compose_phone_number(identifier, country_code),
            country_code: country_code.to_string(),
        };

        let fetched = match self
            .client
            .request::<LoginPayload, _>(Method::POST, "/api/auth/login", &[], Some(&body))
            .await
        {
            Ok(payload) => Fetched::Live(LoginResult::from_payload(
                payload,
                Some("Login successful".to_string()),
            )),
            Err(error) => {
                warn!(operation = "login", error = %error, "backend unavailable, using demo login");
                let payload = self.client.mock().login(identifier, country_code).await;
                Fetched::Simulated(LoginResult::from_payload(
                    payload,
                    Some("Demo login successful".to_string()),
                ))
            }
        };

        self.persist(fetched.get()).await?;
        info!(
            user_id = %fetched.get().user.id,
            simulated = fetched.is_simulated(),
            "signed in"
        );
        Ok(fetched)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.credentials
            .clear_auth()
            .await
            .map_err(ClientError::Storage)?;
        info!("signed out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<UserProfile>, ClientError> {
        self.credentials.user().await.map_err(ClientError::Storage)
    }

    pub async fn is_authenticated(&self) -> Result<bool, ClientError> {
        self.credentials
            .is_authenticated()
            .await
            .map_err(ClientError::Storage)
    }

    async fn persist(&self, result: &LoginResult) -> Result<(), ClientError> {
        self.credentials
            .set_tokens(
                &result.tokens.access_token,
                result.tokens.refresh_token.as_deref(),
            )
            .await
            .map_err(ClientError::Storage)?;
        self.credentials
            .set_user(&result.user)
            .await
            .map_err(ClientError::Storage)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use trustbridge_mock::MockApiService;
    use trustbridge_storage::{CredentialStore, StorageConfig, TrustBridgeStorage};
    use url::Url;

    use super::AuthService;
    use crate::client::{ApiClient, ClientConfig};

    async fn auth(base_url: Url) -> (AuthService, CredentialStore) {
        let storage = TrustBridgeStorage::connect(&StorageConfig::in_memory())
            .await
            .expect("storage");
        let store = CredentialStore::new(storage);
        let api = ApiClient::new(
            ClientConfig::new(base_url),
            store.clone(),
            MockApiService::without_latency(),
        )
        .expect("client");
        (AuthService::new(Arc::new(api)), store)
    }

    #[tokio::test]
    async fn live_login_persists_backend_session() {
        let router = Router::new().route(
            "/api/auth/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["whatsappNumber"], "+6281234567890");
                assert_eq!(body["countryCode"], "+62");
                Json(json!({
                    "success": true,
                    "data": {
                        "tokens": { "accessToken": "live-a", "refreshToken": "live-r" },
                        "user": { "id": "u-9", "whatsappNumber": "+6281234567890", "kycLevel": 2 }
                    }
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        let (auth, store) = auth(Url::parse(&format!("http://{addr}")).expect("url")).await;
        let result = auth.login("812-3456-7890", "+62").await.expect("login");

        assert!(!result.is_simulated());
        assert_eq!(store.access_token().await.expect("token").as_deref(), Some("live-a"));
        assert_eq!(store.refresh_token().await.expect("token").as_deref(), Some("live-r"));
        let user = auth.current_user().await.expect("user").expect("stored");
        assert_eq!(user.id, "u-9");
        assert_eq!(user.extra.get("kycLevel"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn failed_login_falls_back_to_demo_session() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let (auth, store) = auth(Url::parse(&format!("http://{addr}")).expect("url")).await;
        let result = auth.login("812 3456 7890", "62").await.expect("login");

        assert!(result.is_simulated());
        let result = result.into_inner();
        assert!(result.success);
        assert!(result.tokens.access_token.starts_with("mock_access_token_"));
        assert_eq!(
            result.user.whatsapp_number.as_deref(),
            Some("+6281234567890")
        );
        assert!(store.is_authenticated().await.expect("auth"));

        auth.logout().await.expect("logout");
        assert!(!auth.is_authenticated().await.expect("auth"));
        assert!(auth.current_user().await.expect("user").is_none());
    }
}
