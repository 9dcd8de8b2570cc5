use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::TransferStatus;

pub type TransferId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    Wallet,
    Mastercard,
    Visa,
    Other(String),
}

impl From<String> for PaymentMethod {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "WALLET" => PaymentMethod::Wallet,
            "MASTERCARD" => PaymentMethod::Mastercard,
            "VISA" => PaymentMethod::Visa,
            _ => PaymentMethod::Other(raw),
        }
    }
}

impl From<&str> for PaymentMethod {
    fn from(raw: &str) -> Self {
        PaymentMethod::from(raw.to_string())
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.to_string()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Wallet => f.write_str("WALLET"),
            PaymentMethod::Mastercard => f.write_str("MASTERCARD"),
            PaymentMethod::Visa => f.write_str("VISA"),
            PaymentMethod::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculateTransferRequest {
    pub payment_method: PaymentMethod,
    pub sender_currency: String,
    pub amount: f64,
    pub recipient_currency: String,
}

/// Payload for `POST /api/transfer/initiate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub payment_method: PaymentMethod,
    pub sender_currency: String,
    pub sender_amount: f64,
    pub recipient_name: String,
    pub recipient_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fee {
    pub percentage: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainQuote {
    pub uses_mock_token: bool,
    pub hub_token: String,
    pub recipient_token: String,
    pub path: Vec<String>,
    pub policy_ids: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferCalculation {
    pub sender_amount: f64,
    pub sender_currency: String,
    pub recipient_amount: f64,
    pub recipient_currency: String,
    pub exchange_rate: f64,
    pub ada_amount: f64,
    pub blockchain: BlockchainQuote,
    pub fee: Fee,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferInitiation {
    pub transfer_id: TransferId,
    pub status: TransferStatus,
    pub message: String,
    pub estimated_completion: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub transfer_id: TransferId,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferStatusReport {
    pub transfer_id: TransferId,
    pub status: TransferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SenderSummary {
    pub currency: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_charged: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipientSummary {
    pub name: String,
    pub currency: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBlockchain {
    pub path: Vec<String>,
    #[serde(rename = "mockADAAmount")]
    pub mock_ada_amount: f64,
    pub hub_token: String,
    pub recipient_token: String,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub cardano_scan_url: String,
    #[serde(default)]
    pub policy_ids: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferHistoryItem {
    pub transfer_id: TransferId,
    pub status: TransferStatus,
    pub payment_method: PaymentMethod,
    pub sender: SenderSummary,
    pub recipient: RecipientSummary,
    pub blockchain: HistoryBlockchain,
    pub fees: Fee,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferHistory {
    pub transfers: Vec<TransferHistoryItem>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    #[serde(default)]
    pub has_more: bool,
}

impl TransferHistory {
    /// Recomputes `has_more` from the page position and the reported total.
    pub fn normalize_has_more(&mut self) {
        let seen = u64::from(self.offset) + self.transfers.len() as u64;
        self.has_more = seen < self.total;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionItem {
    #[serde(flatten)]
    pub transfer: TransferHistoryItem,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistory {
    pub transactions: Vec<TransactionItem>,
    pub total: u64,
    pub has_more: bool,
}

/// One on-chain step of a settled transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainTransaction {
    pub step: u32,
    pub action: String,
    pub amount: String,
    pub from: String,
    pub to: String,
    pub tx_hash: String,
    pub cardano_scan_url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailsBlockchain {
    pub path: Vec<String>,
    #[serde(rename = "mockADAAmount")]
    pub mock_ada_amount: f64,
    pub hub_token: String,
    pub recipient_token: String,
    #[serde(default)]
    pub policy_ids: BTreeMap<String, String>,
    #[serde(default)]
    pub transactions: Vec<BlockchainTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusTimelineEntry {
    pub status: TransferStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetails {
    pub transfer_id: TransferId,
    pub status: TransferStatus,
    pub payment_method: PaymentMethod,
    pub sender: SenderSummary,
    pub recipient: RecipientSummary,
    pub blockchain: DetailsBlockchain,
    pub fees: Fee,
    #[serde(default)]
    pub timeline: Vec<StatusTimelineEntry>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: u32,
    pub offset: u32,
    pub status: Option<String>,
    pub payment_method: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: 5,
            offset: 0,
            status: None,
            payment_method: None,
        }
    }
}

impl HistoryQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{round2, PaymentMethod, TransactionItem, TransferHistory};

    #[test]
    fn payment_method_round_trips_through_wire_string() {
        let visa: PaymentMethod = serde_json::from_str("\"visa\"").expect("decode");
        assert_eq!(visa, PaymentMethod::Visa);
        assert_eq!(serde_json::to_string(&visa).expect("encode"), "\"VISA\"");
        assert_eq!(PaymentMethod::from("PAYPAL").to_string(), "PAYPAL");
    }

    #[test]
    fn has_more_follows_page_position() {
        let mut history = TransferHistory {
            transfers: Vec::new(),
            total: 4,
            limit: 2,
            offset: 4,
            has_more: true,
        };
        history.normalize_has_more();
        assert!(!history.has_more);

        history.offset = 1;
        history.normalize_has_more();
        assert!(history.has_more);
    }

    #[test]
    fn transaction_item_flattens_transfer_fields() {
        let raw = serde_json::json!({
            "transferId": "TXN-1",
            "status": "COMPLETED",
            "paymentMethod": "WALLET",
            "sender": { "currency": "USD", "amount": 10.0 },
            "recipient": { "name": "Ana", "currency": "EUR", "amount": 8.5 },
            "blockchain": {
                "path": ["ADA"],
                "mockADAAmount": 1.0,
                "hubToken": "mockUSD",
                "recipientToken": "mockEUR"
            },
            "fees": { "percentage": 2.5, "amount": 0.25 },
            "createdAt": "2024-01-15T10:30:00Z",
            "type": "transfer",
            "description": "WALLET payment to Ana"
        });
        let item: TransactionItem = serde_json::from_value(raw).expect("decode");
        assert_eq!(item.kind, "transfer");
        assert_eq!(item.transfer.recipient.name, "Ana");
        assert!(item.transfer.blockchain.tx_hash.is_empty());
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round2(102.499), 102.5);
        assert_eq!(round2(2.456), 2.46);
    }
}
