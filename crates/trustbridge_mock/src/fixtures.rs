//! Canned backend payloads, one per endpoint.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use trustbridge_contract::{
    AssetQuantity, BackendWalletInfo, CardanoToken, CurrencyShare, DailyActivity, ExchangeRate,
    TokenStats, TokenWithStats, TransactionStats, WalletBalance,
};
use trustbridge_transfer::{
    BlockchainTransaction, DetailsBlockchain, Fee, HistoryBlockchain, PaymentMethod,
    RecipientSummary, SenderSummary, StatusTimelineEntry, TransferDetails, TransferHistory,
    TransferHistoryItem, TransferStatus,
};

pub const CARDANOSCAN_TX_URL: &str = "https://preprod.cardanoscan.io/transaction/";
pub const FEE_PERCENTAGE: f64 = 2.5;
pub const ADA_PER_UNIT: f64 = 0.65;
pub const HISTORY_TOTAL: u64 = 28;

pub const MOCK_USD_POLICY: &str = "f66d78b4bcf24e091c1d31f35d9e4c3a2b1f8e7d6c5b4a3";
pub const MOCK_IDR_POLICY: &str = "a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0";
pub const MOCK_EUR_POLICY: &str = "c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0u1v2";
pub const MOCK_GBP_POLICY: &str = "d5e6f7g8h9i0j1k2l3m4n5o6p7q8r9s0t1u2v3w4";

const BACKEND_ADDRESS: &str = "addr_test1qpa0rd55emex859ggm83ukpxv5wvzlg7cx0w2c9lw2szkpeh3lvdgekjev6eyn7rr7px8e7kkc72zewmvnvkr4zxl7zqx46s82";

/// Quote table used by the simulated calculator. Unknown pairs quote 1.
pub fn exchange_rate(from: &str, to: &str) -> f64 {
    match (from, to) {
        ("USD", "IDR") => 15000.0,
        ("USD", "EUR") => 0.85,
        ("USD", "GBP") => 0.795,
        ("EUR", "USD") => 1.085,
        ("EUR", "IDR") => 16275.0,
        ("EUR", "GBP") => 0.935,
        ("GBP", "USD") => 1.258,
        ("GBP", "EUR") => 1.069,
        ("GBP", "IDR") => 18870.0,
        _ => 1.0,
    }
}

pub fn mock_token(currency: &str) -> String {
    format!("mock{currency}")
}

pub fn policy_id(token: &str) -> &'static str {
    match token {
        "mockIDR" => MOCK_IDR_POLICY,
        "mockEUR" => MOCK_EUR_POLICY,
        "mockGBP" => MOCK_GBP_POLICY,
        _ => MOCK_USD_POLICY,
    }
}

fn policy_ids(tokens: &[&str]) -> BTreeMap<String, String> {
    tokens
        .iter()
        .map(|token| (token.to_string(), policy_id(token).to_string()))
        .collect()
}

fn path(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|token| token.to_string()).collect()
}

fn fixture_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn scan_url(tx_hash: &str) -> String {
    if tx_hash.is_empty() {
        String::new()
    } else {
        format!("{CARDANOSCAN_TX_URL}{tx_hash}")
    }
}

pub fn backend_info() -> BackendWalletInfo {
    let asset = |unit: &str, quantity: &str| AssetQuantity {
        unit: unit.to_string(),
        quantity: quantity.to_string(),
    };
    BackendWalletInfo {
        address: BACKEND_ADDRESS.to_string(),
        public_key_hash: "e3c5d8f2a7b1c9e4f6d2a8b5c7e9f1a3d5c8b2e6f9a1c4d7b0e3f6a9c2d5e8f1"
            .to_string(),
        balance: WalletBalance {
            ada: 1250.75,
            lovelace: "1250750000".to_string(),
            assets: vec![
                asset("mockADA", "1000000"),
                asset("mockUSDC", "5000000"),
                asset("mockIDR", "15000000"),
                asset("mockEUR", "2500000"),
            ],
        },
        is_ready: true,
    }
}

pub fn transfer_history_items() -> Vec<TransferHistoryItem> {
    let completed_hash = "a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0u1v2w3x4y5z6";
    let processing_hash = "b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0u1v2w3x4y5z6a1";

    vec![
        TransferHistoryItem {
            transfer_id: "TXN-2024-001234".to_string(),
            status: TransferStatus::Completed,
            payment_method: PaymentMethod::Wallet,
            sender: SenderSummary {
                currency: "USD".to_string(),
                amount: 250.0,
                symbol: Some("$".to_string()),
                total_charged: None,
            },
            recipient: RecipientSummary {
                name: "Ahmad Rahman".to_string(),
                currency: "IDR".to_string(),
                amount: 3_750_000.0,
                symbol: Some("Rp".to_string()),
                bank: Some("Bank Central Asia".to_string()),
                account: Some("****5678".to_string()),
            },
            blockchain: HistoryBlockchain {
                path: path(&["ADA", "mockUSD", "mockIDR"]),
                mock_ada_amount: 150.5,
                hub_token: "mockUSD".to_string(),
                recipient_token: "mockIDR".to_string(),
                tx_hash: completed_hash.to_string(),
                cardano_scan_url: scan_url(completed_hash),
                policy_ids: policy_ids(&["mockUSD", "mockIDR"]),
            },
            fees: Fee {
                percentage: FEE_PERCENTAGE,
                amount: 6.25,
            },
            created_at: fixture_time(2024, 1, 15, 10, 30),
            completed_at: Some(fixture_time(2024, 1, 15, 10, 35)),
        },
        TransferHistoryItem {
            transfer_id: "TXN-2024-001235".to_string(),
            status: TransferStatus::Processing,
            payment_method: PaymentMethod::Mastercard,
            sender: SenderSummary {
                currency: "EUR".to_string(),
                amount: 100.0,
                symbol: Some("€".to_string()),
                total_charged: None,
            },
            recipient: RecipientSummary {
                name: "Maria Garcia".to_string(),
                currency: "USD".to_string(),
                amount: 108.5,
                symbol: Some("$".to_string()),
                bank: Some("Chase Bank".to_string()),
                account: Some("****9012".to_string()),
            },
            blockchain: HistoryBlockchain {
                path: path(&["ADA", "mockEUR", "mockUSD"]),
                mock_ada_amount: 75.25,
                hub_token: "mockEUR".to_string(),
                recipient_token: "mockUSD".to_string(),
                tx_hash: processing_hash.to_string(),
                cardano_scan_url: scan_url(processing_hash),
                policy_ids: policy_ids(&["mockEUR", "mockUSD"]),
            },
            fees: Fee {
                percentage: FEE_PERCENTAGE,
                amount: 2.5,
            },
            created_at: fixture_time(2024, 1, 16, 14, 20),
            completed_at: None,
        },
        TransferHistoryItem {
            transfer_id: "TXN-2024-001236".to_string(),
            status: TransferStatus::Failed,
            payment_method: PaymentMethod::Visa,
            sender: SenderSummary {
                currency: "USD".to_string(),
                amount: 50.0,
                symbol: Some("$".to_string()),
                total_charged: None,
            },
            recipient: RecipientSummary {
                name: "John Smith".to_string(),
                currency: "GBP".to_string(),
                amount: 39.75,
                symbol: Some("£".to_string()),
                bank: Some("Barclays Bank".to_string()),
                account: Some("****3456".to_string()),
            },
            blockchain: HistoryBlockchain {
                path: path(&["ADA", "mockUSD", "mockGBP"]),
                mock_ada_amount: 35.0,
                hub_token: "mockUSD".to_string(),
                recipient_token: "mockGBP".to_string(),
                tx_hash: String::new(),
                cardano_scan_url: String::new(),
                policy_ids: policy_ids(&["mockUSD", "mockGBP"]),
            },
            fees: Fee {
                percentage: FEE_PERCENTAGE,
                amount: 1.25,
            },
            created_at: fixture_time(2024, 1, 17, 9, 15),
            completed_at: None,
        },
    ]
}

pub fn transfer_history() -> TransferHistory {
    TransferHistory {
        transfers: transfer_history_items(),
        total: HISTORY_TOTAL,
        limit: 5,
        offset: 0,
        has_more: true,
    }
}

pub fn exchange_rates(now: DateTime<Utc>) -> Vec<ExchangeRate> {
    [
        ("USD", "IDR"),
        ("USD", "EUR"),
        ("USD", "GBP"),
        ("EUR", "USD"),
        ("EUR", "IDR"),
        ("GBP", "USD"),
    ]
    .into_iter()
    .map(|(from, to)| (from, to, exchange_rate(from, to)))
    .chain(std::iter::once(("ADA", "USD", 0.385)))
    .map(|(from, to, rate)| ExchangeRate {
        from: from.to_string(),
        to: to.to_string(),
        rate,
        timestamp: now,
    })
    .collect()
}

pub fn cardano_tokens() -> Vec<TokenWithStats> {
    vec![
        TokenWithStats {
            token: CardanoToken {
                id: 1,
                token_name: "mockUSD".to_string(),
                token_symbol: "mUSD".to_string(),
                policy_id: MOCK_USD_POLICY.to_string(),
                asset_unit: MOCK_USD_POLICY.to_string(),
                decimals: 6,
                total_supply: "10000000000000".to_string(),
                deployment_tx_hash: "abc123def456ghi789jkl012mno345pqr678stu901vwx234yz567"
                    .to_string(),
                cardano_network: "Preprod".to_string(),
                description: "Mock USD token for testing cross-border payments".to_string(),
                is_active: true,
                deployed_at: fixture_time(2024, 1, 1, 0, 0),
            },
            stats: TokenStats {
                total_mints: 45,
                total_minted_amount: "5000000000".to_string(),
                total_swaps: 123,
                last_activity: fixture_time(2024, 1, 17, 15, 30),
            },
        },
        TokenWithStats {
            token: CardanoToken {
                id: 2,
                token_name: "mockIDR".to_string(),
                token_symbol: "mIDR".to_string(),
                policy_id: MOCK_IDR_POLICY.to_string(),
                asset_unit: MOCK_IDR_POLICY.to_string(),
                decimals: 2,
                total_supply: "150000000000000".to_string(),
                deployment_tx_hash: "def456ghi789jkl012mno345pqr678stu901vwx234yz567abc123"
                    .to_string(),
                cardano_network: "Preprod".to_string(),
                description: "Mock Indonesian Rupiah token for remittance testing".to_string(),
                is_active: true,
                deployed_at: fixture_time(2024, 1, 1, 0, 0),
            },
            stats: TokenStats {
                total_mints: 32,
                total_minted_amount: "480000000000".to_string(),
                total_swaps: 89,
                last_activity: fixture_time(2024, 1, 17, 14, 45),
            },
        },
    ]
}

pub fn transaction_stats() -> TransactionStats {
    let share = |currency: &str, count: u64, percentage: f64| CurrencyShare {
        currency: currency.to_string(),
        count,
        percentage,
    };
    let day = |date: &str, transactions: u64, amount: f64| DailyActivity {
        date: date.to_string(),
        transactions,
        amount,
    };

    TransactionStats {
        total_transactions: HISTORY_TOTAL,
        completed_transactions: 22,
        processing_transactions: 3,
        failed_transactions: 3,
        total_amount: 12450.75,
        average_amount: 445.38,
        total_fees: 311.27,
        popular_currencies: vec![
            share("USD", 15, 53.6),
            share("EUR", 8, 28.6),
            share("IDR", 5, 17.8),
        ],
        recent_activity: vec![
            day("2024-01-17", 3, 400.0),
            day("2024-01-16", 5, 750.5),
            day("2024-01-15", 8, 1250.75),
            day("2024-01-14", 4, 520.0),
            day("2024-01-13", 6, 890.25),
        ],
    }
}

/// Details for `transfer_id` with an on-chain and a status timeline that
/// end twenty minutes before `now`.
pub fn transfer_details(transfer_id: &str, now: DateTime<Utc>) -> TransferDetails {
    let minutes_ago = |minutes: i64| now - Duration::minutes(minutes);
    let stem = transfer_id.replace("TXN-", "");
    let step = |step: u32, action: &str, amount: &str, from: &str, to: &str, suffix: &str, ago| {
        let tx_hash = format!("{stem}{suffix}");
        BlockchainTransaction {
            step,
            action: action.to_string(),
            amount: amount.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            cardano_scan_url: scan_url(&tx_hash),
            tx_hash,
            timestamp: minutes_ago(ago),
        }
    };

    TransferDetails {
        transfer_id: transfer_id.to_string(),
        status: TransferStatus::Processing,
        payment_method: PaymentMethod::Wallet,
        sender: SenderSummary {
            currency: "USD".to_string(),
            amount: 100.0,
            symbol: Some("$".to_string()),
            total_charged: Some(102.5),
        },
        recipient: RecipientSummary {
            name: "Ahmad Rahman".to_string(),
            currency: "IDR".to_string(),
            amount: 1_485_000.0,
            symbol: Some("Rp".to_string()),
            bank: Some("Bank Central Asia".to_string()),
            account: Some("1234567890".to_string()),
        },
        blockchain: DetailsBlockchain {
            path: path(&["ADA", "mockUSD", "mockIDR"]),
            mock_ada_amount: 65.5,
            hub_token: "mockUSD".to_string(),
            recipient_token: "mockIDR".to_string(),
            policy_ids: policy_ids(&["mockUSD", "mockIDR"]),
            transactions: vec![
                step(
                    1,
                    "Payment Confirmation",
                    "102.50 USD",
                    "User Wallet",
                    "TrustBridge",
                    "abc123",
                    25,
                ),
                step(
                    2,
                    "Mint mockUSD",
                    "100.00 mockUSD",
                    "Minting Contract",
                    "Backend Wallet",
                    "def456",
                    20,
                ),
            ],
        },
        fees: Fee {
            percentage: FEE_PERCENTAGE,
            amount: 2.5,
        },
        timeline: vec![
            StatusTimelineEntry {
                status: TransferStatus::Initiated,
                timestamp: minutes_ago(30),
            },
            StatusTimelineEntry {
                status: TransferStatus::PaymentConfirmed,
                timestamp: minutes_ago(25),
            },
            StatusTimelineEntry {
                status: TransferStatus::Minted("MOCKADA".to_string()),
                timestamp: minutes_ago(20),
            },
        ],
        created_at: minutes_ago(30),
        completed_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::{exchange_rate, exchange_rates, transfer_details, transfer_history};
    use chrono::{Duration, Utc};
    use trustbridge_transfer::TransferStatus;

    #[test]
    fn unknown_pairs_quote_one() {
        assert_eq!(exchange_rate("USD", "IDR"), 15000.0);
        assert_eq!(exchange_rate("JPY", "USD"), 1.0);
    }

    #[test]
    fn history_fixture_shape() {
        let history = transfer_history();
        assert_eq!(history.transfers.len(), 3);
        assert_eq!(history.total, 28);
        assert!(history.has_more);
    }

    #[test]
    fn rates_fixture_includes_ada() {
        let rates = exchange_rates(Utc::now());
        assert_eq!(rates.len(), 7);
        assert!(rates.iter().any(|r| r.from == "ADA" && r.rate == 0.385));
    }

    #[test]
    fn details_timelines_are_ordered_and_derived_from_id() {
        let now = Utc::now();
        let details = transfer_details("TXN-42", now);

        let hashes: Vec<&str> = details
            .blockchain
            .transactions
            .iter()
            .map(|tx| tx.tx_hash.as_str())
            .collect();
        assert_eq!(hashes, vec!["42abc123", "42def456"]);

        assert_eq!(details.timeline.len(), 3);
        assert_eq!(details.timeline[0].timestamp, now - Duration::minutes(30));
        assert!(details
            .timeline
            .windows(2)
            .all(|pair| pair[0].status.can_advance_to(&pair[1].status)
                && pair[0].timestamp < pair[1].timestamp));
        assert_eq!(
            details.timeline[2].status,
            TransferStatus::Minted("MOCKADA".to_string())
        );
    }
}
