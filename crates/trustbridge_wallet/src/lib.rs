pub mod bridge;
pub mod manager;

pub use bridge::{
    format_ada, supported_wallet, total_lovelace, InMemoryWalletBridge, InMemoryWalletSession,
    SignedTx, UnsignedTx, Utxo, WalletBridge, WalletError, WalletProvider, WalletSession,
    SUPPORTED_WALLETS,
};
pub use manager::{
    ConnectionState, WalletConnectionManager, WalletSnapshot, DEFAULT_REFRESH_INTERVAL,
};
