pub mod credentials;
pub mod repository;

pub use credentials::{
    AuthHeaders, CredentialStore, ACCESS_TOKEN_KEY, CONNECTED_WALLET_KEY, REFRESH_TOKEN_KEY,
    USER_KEY,
};
pub use repository::{KvEntry, StorageConfig, TrustBridgeStorage};
