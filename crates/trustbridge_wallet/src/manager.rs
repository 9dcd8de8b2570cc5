use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use trustbridge_storage::CredentialStore;

use crate::bridge::{format_ada, total_lovelace, WalletBridge, WalletError, WalletSession};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSnapshot {
    pub state: ConnectionState,
    pub provider: Option<String>,
    pub address: Option<String>,
    pub balance: String,
}

struct Connection {
    state: ConnectionState,
    provider: Option<String>,
    session: Option<Arc<dyn WalletSession>>,
    address: Option<String>,
    balance: String,
    /// Bumped on every connect and disconnect so late async results from an
    /// earlier connection can be recognised and dropped.
    epoch: u64,
    refresh_task: Option<JoinHandle<()>>,
}

impl Connection {
    fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            provider: None,
            session: None,
            address: None,
            balance: format_ada(0),
            epoch: 0,
            refresh_task: None,
        }
    }

    fn reset(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        self.epoch += 1;
        self.state = ConnectionState::Disconnected;
        self.provider = None;
        self.session = None;
        self.address = None;
        self.balance = format_ada(0);
    }
}

/// Connection to one browser-style wallet, with a background balance poll
/// that lives exactly as long as the connection.
pub struct WalletConnectionManager {
    bridge: Arc<dyn WalletBridge>,
    credentials: CredentialStore,
    refresh_interval: Duration,
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for WalletConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnectionManager")
            .field("refresh_interval", &self.refresh_interval)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl WalletConnectionManager {
    pub fn new(bridge: Arc<dyn WalletBridge>, credentials: CredentialStore) -> Self {
        Self {
            bridge,
            credentials,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            connection: Arc::new(Mutex::new(Connection::new())),
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.connection).state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn balance(&self) -> String {
        lock(&self.connection).balance.clone()
    }

    pub fn address(&self) -> Option<String> {
        lock(&self.connection).address.clone()
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        let connection = lock(&self.connection);
        WalletSnapshot {
            state: connection.state,
            provider: connection.provider.clone(),
            address: connection.address.clone(),
            balance: connection.balance.clone(),
        }
    }

    pub async fn connect(&self, provider: &str) -> Result<WalletSnapshot, WalletError> {
        let epoch = {
            let mut connection = lock(&self.connection);
            connection.reset();
            connection.state = ConnectionState::Connecting;
            connection.provider = Some(provider.to_string());
            connection.epoch
        };

        let opened = async {
            let session = self.bridge.enable(provider).await?;
            let address = session.change_address().await?;
            Ok::<_, WalletError>((session, address))
        }
        .await;

        let (session, address) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                let mut connection = lock(&self.connection);
                if connection.epoch == epoch {
                    connection.reset();
                }
                error!(provider = %provider, error = %err, "wallet connection failed");
                return Err(err);
            }
        };

        {
            let mut connection = lock(&self.connection);
            if connection.epoch != epoch {
                return Err(WalletError::Superseded);
            }
            connection.session = Some(session);
            connection.address = Some(address);
        }

        if let Err(err) = refresh(&self.connection).await {
            warn!(provider = %provider, error = %err, "initial balance refresh failed");
        }
        if let Err(err) = self.credentials.remember_wallet(provider).await {
            warn!(error = %err, "failed to remember wallet provider");
        }

        let task = tokio::spawn(poll_balance(
            Arc::clone(&self.connection),
            self.refresh_interval,
            epoch,
        ));
        let mut connection = lock(&self.connection);
        if connection.epoch != epoch {
            task.abort();
            return Err(WalletError::Superseded);
        }
        connection.refresh_task = Some(task);
        connection.state = ConnectionState::Connected;
        info!(
            provider = %provider,
            balance = %connection.balance,
            "wallet connected"
        );
        Ok(WalletSnapshot {
            state: connection.state,
            provider: connection.provider.clone(),
            address: connection.address.clone(),
            balance: connection.balance.clone(),
        })
    }

    /// Re-reads the wallet's UTXOs. Does nothing while disconnected.
    pub async fn refresh_balance(&self) -> Result<(), WalletError> {
        refresh(&self.connection).await
    }

    /// Pays `amount_ada` to `recipient` and returns the transaction hash.
    pub async fn send_transaction(
        &self,
        recipient: &str,
        amount_ada: f64,
    ) -> Result<String, WalletError> {
        if !amount_ada.is_finite() || amount_ada <= 0.0 {
            return Err(WalletError::InvalidAmount(amount_ada));
        }
        let session = lock(&self.connection)
            .session
            .clone()
            .ok_or(WalletError::NotConnected)?;

        let lovelace = (amount_ada * 1_000_000.0).round() as u64;
        let unsigned = session.build_payment(recipient, lovelace).await?;
        let signed = session.sign_tx(unsigned).await?;
        let tx_hash = session.submit_tx(signed).await?;
        info!(tx_hash = %tx_hash, recipient = %recipient, lovelace, "payment submitted");

        if let Err(err) = refresh(&self.connection).await {
            warn!(error = %err, "balance refresh after payment failed");
        }
        Ok(tx_hash)
    }

    /// Reconnects to the provider remembered from an earlier session.
    ///
    /// A provider that can no longer be enabled is forgotten. Returns the
    /// provider name when the session was restored.
    pub async fn restore_session(&self) -> Option<String> {
        let provider = match self.credentials.remembered_wallet().await {
            Ok(Some(provider)) => provider,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "failed to read remembered wallet");
                return None;
            }
        };

        match self.connect(&provider).await {
            Ok(_) => Some(provider),
            Err(err) => {
                info!(provider = %provider, error = %err, "forgetting wallet that could not be restored");
                if let Err(err) = self.credentials.forget_wallet().await {
                    warn!(error = %err, "failed to forget wallet provider");
                }
                None
            }
        }
    }

    pub async fn disconnect(&self) {
        lock(&self.connection).reset();
        if let Err(err) = self.credentials.forget_wallet().await {
            warn!(error = %err, "failed to forget wallet provider");
        }
        info!("wallet disconnected");
    }
}

impl Drop for WalletConnectionManager {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.connection).refresh_task.take() {
            task.abort();
        }
    }
}

fn lock(connection: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    connection.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn refresh(connection: &Mutex<Connection>) -> Result<(), WalletError> {
    let (session, epoch) = {
        let guard = lock(connection);
        match &guard.session {
            Some(session) => (Arc::clone(session), guard.epoch),
            None => return Ok(()),
        }
    };

    let utxos = session.utxos().await?;
    let balance = format_ada(total_lovelace(&utxos));

    let mut guard = lock(connection);
    if guard.epoch != epoch {
        debug!("discarding balance from a stale connection");
        return Ok(());
    }
    guard.balance = balance;
    Ok(())
}

async fn poll_balance(connection: Arc<Mutex<Connection>>, period: Duration, epoch: u64) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if lock(&connection).epoch != epoch {
            break;
        }
        if let Err(err) = refresh(&connection).await {
            warn!(error = %err, "periodic balance refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use trustbridge_storage::{CredentialStore, StorageConfig, TrustBridgeStorage};

    use super::{ConnectionState, WalletConnectionManager};
    use crate::bridge::{
        InMemoryWalletBridge, InMemoryWalletSession, SignedTx, UnsignedTx, Utxo, WalletError,
        WalletSession,
    };

    async fn store() -> CredentialStore {
        let storage = TrustBridgeStorage::connect(&StorageConfig::in_memory())
            .await
            .expect("storage");
        CredentialStore::new(storage)
    }

    fn funded_session() -> Arc<InMemoryWalletSession> {
        Arc::new(InMemoryWalletSession::new(
            "addr_test1qpzry9x8gf2tvdw0s3jn54khce6mua7l",
            vec![
                Utxo::lovelace("aa", 0, 2_500_000),
                Utxo::lovelace("bb", 1, 1_234_567),
            ],
        ))
    }

    #[tokio::test]
    async fn connect_reports_balance_and_remembers_provider() {
        let credentials = store().await;
        let bridge = InMemoryWalletBridge::new().with_session("nami", funded_session());
        let manager = WalletConnectionManager::new(Arc::new(bridge), credentials.clone());

        let snapshot = manager.connect("nami").await.expect("connect");

        assert_eq!(snapshot.state, ConnectionState::Connected);
        assert_eq!(snapshot.balance, "3.73");
        assert_eq!(snapshot.provider.as_deref(), Some("nami"));
        assert_eq!(
            credentials.remembered_wallet().await.expect("wallet").as_deref(),
            Some("nami")
        );

        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.balance(), "0.00");
        assert!(credentials.remembered_wallet().await.expect("wallet").is_none());
    }

    #[tokio::test]
    async fn failed_connect_leaves_disconnected() {
        let bridge = InMemoryWalletBridge::new().with_declined("eternl");
        let manager = WalletConnectionManager::new(Arc::new(bridge), CredentialStore::detached());

        let result = manager.connect("eternl").await;
        assert!(matches!(result, Err(WalletError::Rejected { .. })));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.address().is_none());
    }

    #[tokio::test]
    async fn send_requires_connection_and_positive_amount() {
        let session = funded_session();
        let bridge = InMemoryWalletBridge::new().with_session("flint", session.clone());
        let manager = WalletConnectionManager::new(Arc::new(bridge), CredentialStore::detached());

        assert!(matches!(
            manager.send_transaction("addr_test1x", 1.0).await,
            Err(WalletError::NotConnected)
        ));

        manager.connect("flint").await.expect("connect");
        for amount in [0.0, -2.0, f64::NAN] {
            assert!(matches!(
                manager.send_transaction("addr_test1x", amount).await,
                Err(WalletError::InvalidAmount(_))
            ));
        }

        let hash = manager
            .send_transaction("addr_test1recipient", 1.5)
            .await
            .expect("send");
        assert_eq!(session.submitted(), vec![hash]);
        assert_eq!(manager.balance(), "2.23");
    }

    #[tokio::test]
    async fn restore_forgets_unknown_provider() {
        let credentials = store().await;
        credentials.remember_wallet("gerowallet").await.expect("remember");
        let manager = WalletConnectionManager::new(
            Arc::new(InMemoryWalletBridge::demo()),
            credentials.clone(),
        );

        assert!(manager.restore_session().await.is_none());
        assert!(credentials.remembered_wallet().await.expect("wallet").is_none());
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        credentials.remember_wallet("yoroi").await.expect("remember");
        assert_eq!(manager.restore_session().await.as_deref(), Some("yoroi"));
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn background_refresh_picks_up_new_utxos() {
        let session = funded_session();
        let bridge = InMemoryWalletBridge::new().with_session("eternl", session.clone());
        let manager = WalletConnectionManager::new(Arc::new(bridge), CredentialStore::detached())
            .with_refresh_interval(Duration::from_millis(20));

        manager.connect("eternl").await.expect("connect");
        session.set_utxos(vec![Utxo::lovelace("cc", 0, 10_000_000)]);

        let mut balance = manager.balance();
        for _ in 0..50 {
            if balance == "10.00" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            balance = manager.balance();
        }
        assert_eq!(balance, "10.00");
    }

    /// Session whose UTXO query blocks until released.
    struct GatedSession {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl WalletSession for GatedSession {
        async fn change_address(&self) -> Result<String, WalletError> {
            Ok("addr_test1gated".to_string())
        }

        async fn utxos(&self) -> Result<Vec<Utxo>, WalletError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(vec![Utxo::lovelace("dd", 0, 99_000_000)])
        }

        async fn build_payment(
            &self,
            _recipient: &str,
            _lovelace: u64,
        ) -> Result<UnsignedTx, WalletError> {
            Err(WalletError::Provider("read only".to_string()))
        }

        async fn sign_tx(&self, _tx: UnsignedTx) -> Result<SignedTx, WalletError> {
            Err(WalletError::Provider("read only".to_string()))
        }

        async fn submit_tx(&self, _tx: SignedTx) -> Result<String, WalletError> {
            Err(WalletError::Provider("read only".to_string()))
        }
    }

    #[tokio::test]
    async fn refresh_finishing_after_disconnect_is_discarded() {
        let session = Arc::new(GatedSession {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let bridge = InMemoryWalletBridge::new().with_session("gated", session.clone());
        let manager = Arc::new(WalletConnectionManager::new(
            Arc::new(bridge),
            CredentialStore::detached(),
        ));

        let connecting = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.connect("gated").await }
        });
        session.entered.notified().await;
        session.release.notify_one();
        connecting.await.expect("join").expect("connect");
        assert_eq!(manager.balance(), "99.00");

        let refreshing = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.refresh_balance().await }
        });
        session.entered.notified().await;
        manager.disconnect().await;
        session.release.notify_one();
        refreshing.await.expect("join").expect("refresh");

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.balance(), "0.00");
    }
}
