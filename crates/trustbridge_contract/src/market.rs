use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetQuantity {
    pub unit: String,
    pub quantity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletBalance {
    pub ada: f64,
    pub lovelace: String,
    pub assets: Vec<AssetQuantity>,
}

/// Settlement wallet operated by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendWalletInfo {
    pub address: String,
    pub public_key_hash: String,
    pub balance: WalletBalance,
    pub is_ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardanoToken {
    pub id: i64,
    pub token_name: String,
    pub token_symbol: String,
    pub policy_id: String,
    pub asset_unit: String,
    pub decimals: u32,
    pub total_supply: String,
    pub deployment_tx_hash: String,
    pub cardano_network: String,
    pub description: String,
    pub is_active: bool,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
    pub total_mints: u64,
    pub total_minted_amount: String,
    pub total_swaps: u64,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenWithStats {
    pub token: CardanoToken,
    pub stats: TokenStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencyShare {
    pub currency: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyActivity {
    pub date: String,
    pub transactions: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub total_transactions: u64,
    pub completed_transactions: u64,
    pub processing_transactions: u64,
    pub failed_transactions: u64,
    pub total_amount: f64,
    pub average_amount: f64,
    pub total_fees: f64,
    pub popular_currencies: Vec<CurrencyShare>,
    pub recent_activity: Vec<DailyActivity>,
}
