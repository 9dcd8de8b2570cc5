use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use trustbridge_contract::AssetQuantity;
use uuid::Uuid;

pub const LOVELACE_UNIT: &str = "lovelace";
pub const LOVELACE_PER_ADA: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletProvider {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub const SUPPORTED_WALLETS: [WalletProvider; 4] = [
    WalletProvider {
        name: "eternl",
        display_name: "Eternl Wallet",
        description: "Secure and feature-rich Cardano wallet",
    },
    WalletProvider {
        name: "nami",
        display_name: "Nami Wallet",
        description: "Simple and intuitive Cardano wallet",
    },
    WalletProvider {
        name: "flint",
        display_name: "Flint Wallet",
        description: "Fast and lightweight wallet",
    },
    WalletProvider {
        name: "yoroi",
        display_name: "Yoroi Wallet",
        description: "Official EMURGO wallet",
    },
];

pub fn supported_wallet(name: &str) -> Option<&'static WalletProvider> {
    SUPPORTED_WALLETS
        .iter()
        .find(|wallet| wallet.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub tx_hash: String,
    pub output_index: u32,
    pub amount: Vec<AssetQuantity>,
}

impl Utxo {
    pub fn lovelace(tx_hash: impl Into<String>, output_index: u32, quantity: u64) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            output_index,
            amount: vec![AssetQuantity {
                unit: LOVELACE_UNIT.to_string(),
                quantity: quantity.to_string(),
            }],
        }
    }

    /// Lovelace held by this output; unparsable quantities count as zero.
    pub fn lovelace_amount(&self) -> u64 {
        self.amount
            .iter()
            .filter(|asset| asset.unit == LOVELACE_UNIT)
            .filter_map(|asset| asset.quantity.parse::<u64>().ok())
            .sum()
    }
}

pub fn total_lovelace(utxos: &[Utxo]) -> u64 {
    utxos.iter().map(Utxo::lovelace_amount).sum()
}

/// ADA balance rendered with two decimals, e.g. `"3.73"`.
pub fn format_ada(lovelace: u64) -> String {
    format!("{:.2}", lovelace as f64 / LOVELACE_PER_ADA)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    pub id: String,
    pub recipient: String,
    pub outputs: Vec<AssetQuantity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub tx: UnsignedTx,
    pub witness: String,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet provider {0} is not installed")]
    ProviderNotFound(String),
    #[error("wallet provider {provider} refused access: {reason}")]
    Rejected { provider: String, reason: String },
    #[error("wallet not connected")]
    NotConnected,
    #[error("invalid payment amount: {0}")]
    InvalidAmount(f64),
    #[error("insufficient funds: {required} lovelace required, {available} available")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("connection was replaced before it completed")]
    Superseded,
    #[error("wallet provider failure: {0}")]
    Provider(String),
}

/// Entry point of an installed wallet extension.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    async fn enable(&self, provider: &str) -> Result<Arc<dyn WalletSession>, WalletError>;

    fn installed(&self) -> Vec<String>;
}

/// An enabled wallet. Construction, signing and submission stay inside the
/// wallet; the client only sees opaque transactions and hashes.
#[async_trait]
pub trait WalletSession: Send + Sync {
    async fn change_address(&self) -> Result<String, WalletError>;

    async fn utxos(&self) -> Result<Vec<Utxo>, WalletError>;

    async fn build_payment(&self, recipient: &str, lovelace: u64)
        -> Result<UnsignedTx, WalletError>;

    async fn sign_tx(&self, tx: UnsignedTx) -> Result<SignedTx, WalletError>;

    async fn submit_tx(&self, tx: SignedTx) -> Result<String, WalletError>;
}

#[derive(Default, Clone)]
pub struct InMemoryWalletBridge {
    sessions: HashMap<String, Arc<dyn WalletSession>>,
    declined: BTreeSet<String>,
}

impl std::fmt::Debug for InMemoryWalletBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWalletBridge")
            .field("installed", &self.installed())
            .finish()
    }
}

impl InMemoryWalletBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every supported provider installed with a funded testnet wallet.
    pub fn demo() -> Self {
        SUPPORTED_WALLETS
            .iter()
            .enumerate()
            .fold(Self::new(), |bridge, (index, wallet)| {
                let session = InMemoryWalletSession::new(
                    demo_address(index),
                    vec![
                        Utxo::lovelace(random_hash(), 0, 125_000_000 + index as u64 * 10_000_000),
                        Utxo::lovelace(random_hash(), 1, 4_500_000),
                    ],
                );
                bridge.with_session(wallet.name, Arc::new(session))
            })
    }

    pub fn with_session(mut self, provider: &str, session: Arc<dyn WalletSession>) -> Self {
        self.sessions.insert(provider.to_ascii_lowercase(), session);
        self
    }

    /// Installs `provider` but makes every access request fail as if the
    /// user dismissed the prompt.
    pub fn with_declined(mut self, provider: &str) -> Self {
        self.declined.insert(provider.to_ascii_lowercase());
        self
    }
}

#[async_trait]
impl WalletBridge for InMemoryWalletBridge {
    async fn enable(&self, provider: &str) -> Result<Arc<dyn WalletSession>, WalletError> {
        let key = provider.to_ascii_lowercase();
        if self.declined.contains(&key) {
            return Err(WalletError::Rejected {
                provider: provider.to_string(),
                reason: "user declined access".to_string(),
            });
        }
        let session = self
            .sessions
            .get(&key)
            .cloned()
            .ok_or_else(|| WalletError::ProviderNotFound(provider.to_string()))?;
        info!(provider = %provider, "wallet enabled");
        Ok(session)
    }

    fn installed(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.sessions.keys().cloned().collect();
        names.extend(self.declined.iter().cloned());
        names.into_iter().collect()
    }
}

#[derive(Debug)]
pub struct InMemoryWalletSession {
    address: String,
    utxos: Mutex<Vec<Utxo>>,
    submitted: Mutex<Vec<String>>,
}

impl InMemoryWalletSession {
    pub fn new(address: impl Into<String>, utxos: Vec<Utxo>) -> Self {
        Self {
            address: address.into(),
            utxos: Mutex::new(utxos),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn set_utxos(&self, utxos: Vec<Utxo>) {
        *self.utxos.lock().unwrap_or_else(PoisonError::into_inner) = utxos;
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn available(&self) -> u64 {
        total_lovelace(&self.utxos.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl WalletSession for InMemoryWalletSession {
    async fn change_address(&self) -> Result<String, WalletError> {
        Ok(self.address.clone())
    }

    async fn utxos(&self) -> Result<Vec<Utxo>, WalletError> {
        Ok(self
            .utxos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn build_payment(
        &self,
        recipient: &str,
        lovelace: u64,
    ) -> Result<UnsignedTx, WalletError> {
        if recipient.trim().is_empty() {
            return Err(WalletError::Provider("recipient address is empty".to_string()));
        }
        let available = self.available();
        if lovelace > available {
            return Err(WalletError::InsufficientFunds {
                required: lovelace,
                available,
            });
        }

        Ok(UnsignedTx {
            id: Uuid::now_v7().to_string(),
            recipient: recipient.to_string(),
            outputs: vec![AssetQuantity {
                unit: LOVELACE_UNIT.to_string(),
                quantity: lovelace.to_string(),
            }],
        })
    }

    async fn sign_tx(&self, tx: UnsignedTx) -> Result<SignedTx, WalletError> {
        Ok(SignedTx {
            witness: format!("vkey:{}", self.address),
            tx,
        })
    }

    async fn submit_tx(&self, tx: SignedTx) -> Result<String, WalletError> {
        let spent: u64 = tx
            .tx
            .outputs
            .iter()
            .filter(|asset| asset.unit == LOVELACE_UNIT)
            .filter_map(|asset| asset.quantity.parse::<u64>().ok())
            .sum();

        let hash = random_hash();
        {
            let mut utxos = self.utxos.lock().unwrap_or_else(PoisonError::into_inner);
            let available = total_lovelace(&utxos);
            let change = available.checked_sub(spent).ok_or(WalletError::InsufficientFunds {
                required: spent,
                available,
            })?;
            *utxos = vec![Utxo::lovelace(hash.clone(), 1, change)];
        }
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hash.clone());

        info!(tx_hash = %hash, recipient = %tx.tx.recipient, lovelace = spent, "transaction submitted");
        Ok(hash)
    }
}

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

fn demo_address(seed: usize) -> String {
    let rotate = seed % BECH32_CHARSET.len();
    let body = format!("{}{}", &BECH32_CHARSET[rotate..], &BECH32_CHARSET[..rotate]);
    format!("addr_test1qz{body}{body}")
}

fn random_hash() -> String {
    format!("{}{}", Uuid::now_v7().simple(), Uuid::now_v7().simple())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        format_ada, supported_wallet, total_lovelace, InMemoryWalletBridge, InMemoryWalletSession,
        Utxo, WalletBridge, WalletError, WalletSession, SUPPORTED_WALLETS,
    };
    use trustbridge_contract::AssetQuantity;

    #[test]
    fn sums_lovelace_and_ignores_other_assets() {
        let mut mixed = Utxo::lovelace("a", 0, 2_500_000);
        mixed.amount.push(AssetQuantity {
            unit: "policy.mockUSD".to_string(),
            quantity: "900".to_string(),
        });
        let utxos = vec![mixed, Utxo::lovelace("b", 0, 1_234_567)];

        assert_eq!(total_lovelace(&utxos), 3_734_567);
        assert_eq!(format_ada(total_lovelace(&utxos)), "3.73");
        assert_eq!(format_ada(0), "0.00");
    }

    #[test]
    fn knows_supported_wallets() {
        assert_eq!(SUPPORTED_WALLETS.len(), 4);
        assert_eq!(
            supported_wallet("Eternl").map(|wallet| wallet.display_name),
            Some("Eternl Wallet")
        );
        assert!(supported_wallet("metamask").is_none());
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let bridge = InMemoryWalletBridge::demo();
        assert_eq!(bridge.installed().len(), 4);
        assert!(matches!(
            bridge.enable("metamask").await,
            Err(WalletError::ProviderNotFound(name)) if name == "metamask"
        ));
    }

    #[tokio::test]
    async fn payment_spends_from_balance() {
        let session = Arc::new(InMemoryWalletSession::new(
            "addr_test1sender",
            vec![Utxo::lovelace("a", 0, 10_000_000)],
        ));

        let too_much = session.build_payment("addr_test1recipient", 20_000_000).await;
        assert!(matches!(
            too_much,
            Err(WalletError::InsufficientFunds { available: 10_000_000, .. })
        ));

        let unsigned = session
            .build_payment("addr_test1recipient", 4_000_000)
            .await
            .expect("build");
        let signed = session.sign_tx(unsigned).await.expect("sign");
        let hash = session.submit_tx(signed).await.expect("submit");

        assert_eq!(hash.len(), 64);
        assert_eq!(session.submitted(), vec![hash]);
        let remaining = session.utxos().await.expect("utxos");
        assert_eq!(total_lovelace(&remaining), 6_000_000);
    }
}
