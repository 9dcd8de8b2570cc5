use serde::{Deserialize, Serialize};

use crate::model::TransferHistoryItem;
use crate::status::TransferStatus;

/// Per-user aggregates derived from the transfer history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserTransferStats {
    pub total_transfers: u64,
    pub completed_transfers: u64,
    pub pending_transfers: u64,
    pub failed_transfers: u64,
    pub total_volume: f64,
    pub average_amount: f64,
}

impl UserTransferStats {
    pub fn from_history(transfers: &[TransferHistoryItem]) -> Self {
        let mut stats = Self {
            total_transfers: transfers.len() as u64,
            ..Self::default()
        };

        for transfer in transfers {
            match &transfer.status {
                TransferStatus::Completed => {
                    stats.completed_transfers += 1;
                    stats.total_volume += transfer.recipient.amount;
                }
                TransferStatus::Failed | TransferStatus::Cancelled => stats.failed_transfers += 1,
                TransferStatus::Other(raw) if is_pending_alias(raw) => {
                    stats.pending_transfers += 1
                }
                TransferStatus::Other(_) => {}
                _ => stats.pending_transfers += 1,
            }
        }

        if stats.completed_transfers > 0 {
            stats.average_amount = stats.total_volume / stats.completed_transfers as f64;
        }
        stats
    }
}

fn is_pending_alias(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "pending" | "paid")
}

#[cfg(test)]
mod tests {
    use super::UserTransferStats;
    use crate::model::TransferHistoryItem;

    fn item(status: &str, amount: f64) -> TransferHistoryItem {
        serde_json::from_value(serde_json::json!({
            "transferId": format!("TXN-{status}"),
            "status": status,
            "paymentMethod": "WALLET",
            "sender": { "currency": "USD", "amount": 10.0 },
            "recipient": { "name": "Ana", "currency": "IDR", "amount": amount },
            "blockchain": {
                "path": ["ADA", "mockUSD", "mockIDR"],
                "mockADAAmount": 6.5,
                "hubToken": "mockUSD",
                "recipientToken": "mockIDR"
            },
            "fees": { "percentage": 2.5, "amount": 0.25 },
            "createdAt": "2024-01-15T10:30:00Z"
        }))
        .expect("fixture")
    }

    #[test]
    fn aggregates_by_status() {
        let history = vec![
            item("COMPLETED", 100.0),
            item("COMPLETED", 300.0),
            item("PROCESSING", 50.0),
            item("paid", 20.0),
            item("FAILED", 10.0),
            item("CANCELLED", 10.0),
        ];

        let stats = UserTransferStats::from_history(&history);
        assert_eq!(stats.total_transfers, 6);
        assert_eq!(stats.completed_transfers, 2);
        assert_eq!(stats.pending_transfers, 2);
        assert_eq!(stats.failed_transfers, 2);
        assert_eq!(stats.total_volume, 400.0);
        assert_eq!(stats.average_amount, 200.0);
    }

    #[test]
    fn empty_history_has_zero_average() {
        let stats = UserTransferStats::from_history(&[]);
        assert_eq!(stats, UserTransferStats::default());
    }
}
