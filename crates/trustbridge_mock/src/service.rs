use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::debug;
use trustbridge_contract::{
    compose_phone_number, AuthTokens, BackendWalletInfo, ExchangeRate, InvoiceDocument,
    LoginPayload, TokenWithStats, TransactionStats, UserProfile,
};
use trustbridge_transfer::{
    round2, BlockchainQuote, Fee, PaymentConfirmation, PaymentMethod, TransactionHistory,
    TransactionItem, TransferCalculation, TransferDetails, TransferHistory, TransferInitiation,
    TransferRequest, TransferStatus, TransferStatusReport,
};
use uuid::Uuid;

use crate::fixtures;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockLatency {
    /// Sleep before answering, like a real round trip.
    #[default]
    Simulated,
    Disabled,
}

/// Answers every backend operation locally with fixture data.
///
/// Never fails. Results have the same types as the live endpoints so a
/// caller can swap one for the other.
#[derive(Debug, Clone, Default)]
pub struct MockApiService {
    latency: MockLatency,
}

impl MockApiService {
    pub fn new(latency: MockLatency) -> Self {
        Self { latency }
    }

    pub fn without_latency() -> Self {
        Self::new(MockLatency::Disabled)
    }

    pub fn is_demo_mode(&self) -> bool {
        true
    }

    async fn delay(&self, millis: u64) {
        if self.latency == MockLatency::Simulated {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    pub async fn backend_info(&self) -> BackendWalletInfo {
        self.delay(300).await;
        fixtures::backend_info()
    }

    pub async fn transfer_history(&self, limit: u32, offset: u32) -> TransferHistory {
        self.delay(400).await;

        let mut history = fixtures::transfer_history();
        let len = history.transfers.len();
        let start = (offset as usize).min(len);
        let end = start.saturating_add(limit as usize).min(len);

        history.transfers = history.transfers.drain(start..end).collect();
        history.limit = limit;
        history.offset = offset;
        history.has_more = end < len;
        history
    }

    pub async fn calculate_transfer(
        &self,
        payment_method: &PaymentMethod,
        sender_currency: &str,
        amount: f64,
        recipient_currency: &str,
    ) -> TransferCalculation {
        self.delay(600).await;
        debug!(method = %payment_method, from = %sender_currency, to = %recipient_currency, "simulated quote");

        let rate = fixtures::exchange_rate(sender_currency, recipient_currency);
        let fee_amount = amount * fixtures::FEE_PERCENTAGE / 100.0;
        let hub_token = fixtures::mock_token(sender_currency);
        let recipient_token = fixtures::mock_token(recipient_currency);

        let policy_ids = [&hub_token, &recipient_token]
            .into_iter()
            .map(|token| (token.clone(), fixtures::policy_id(token).to_string()))
            .collect();

        TransferCalculation {
            sender_amount: amount,
            sender_currency: sender_currency.to_string(),
            recipient_amount: round2(amount * rate),
            recipient_currency: recipient_currency.to_string(),
            exchange_rate: rate,
            ada_amount: amount * fixtures::ADA_PER_UNIT,
            blockchain: BlockchainQuote {
                uses_mock_token: true,
                path: vec!["ADA".to_string(), hub_token.clone(), recipient_token.clone()],
                hub_token,
                recipient_token,
                policy_ids,
            },
            fee: Fee {
                percentage: fixtures::FEE_PERCENTAGE,
                amount: round2(fee_amount),
            },
            total_amount: round2(amount + fee_amount),
        }
    }

    pub async fn initiate_transfer(&self, request: &TransferRequest) -> TransferInitiation {
        self.delay(800).await;

        let now = Utc::now();
        TransferInitiation {
            transfer_id: format!(
                "TXN-{}-{}",
                now.timestamp_millis(),
                random_suffix(6).to_ascii_uppercase()
            ),
            status: TransferStatus::Initiated,
            message: format!(
                "Transfer of {} {} to {} has been initiated successfully.",
                request.sender_amount, request.sender_currency, request.recipient_name
            ),
            estimated_completion: now + ChronoDuration::minutes(30),
        }
    }

    pub async fn transfer_details(&self, transfer_id: &str) -> TransferDetails {
        self.delay(300).await;
        fixtures::transfer_details(transfer_id, Utc::now())
    }

    pub async fn transfer_status(&self, transfer_id: &str) -> TransferStatusReport {
        self.delay(300).await;
        TransferStatusReport {
            transfer_id: transfer_id.to_string(),
            status: TransferStatus::Processing,
            updated_at: Some(Utc::now() - ChronoDuration::minutes(20)),
        }
    }

    pub async fn exchange_rates(&self) -> Vec<ExchangeRate> {
        self.delay(200).await;
        fixtures::exchange_rates(Utc::now())
    }

    pub async fn cardano_tokens(&self) -> Vec<TokenWithStats> {
        self.delay(300).await;
        fixtures::cardano_tokens()
    }

    pub async fn transaction_stats(&self) -> TransactionStats {
        self.delay(400).await;
        fixtures::transaction_stats()
    }

    pub async fn transaction_history(&self, limit: u32) -> TransactionHistory {
        self.delay(350).await;

        let transactions = fixtures::transfer_history_items()
            .into_iter()
            .take(limit as usize)
            .map(|transfer| TransactionItem {
                kind: "transfer".to_string(),
                description: format!(
                    "{} payment to {}",
                    transfer.payment_method, transfer.recipient.name
                ),
                transfer,
            })
            .collect();

        TransactionHistory {
            transactions,
            total: fixtures::HISTORY_TOTAL,
            has_more: u64::from(limit) < fixtures::HISTORY_TOTAL,
        }
    }

    pub async fn confirm_payment(&self, transfer_id: &str, tx_hash: &str) -> PaymentConfirmation {
        self.delay(500).await;
        PaymentConfirmation {
            message: format!(
                "Payment confirmed for transfer {transfer_id}. Transaction hash: {tx_hash}"
            ),
        }
    }

    /// Plain-text stand-in for the invoice PDF.
    pub async fn download_invoice(&self, transfer_id: &str) -> InvoiceDocument {
        self.delay(600).await;
        let body = format!(
            "Mock Invoice for Transfer {transfer_id}\n\nThis is a demo invoice.\nGenerated at: {}",
            Utc::now().to_rfc3339()
        );
        InvoiceDocument::pdf(transfer_id, body.into_bytes())
    }

    pub async fn login(&self, identifier: &str, country_code: &str) -> LoginPayload {
        self.delay(700).await;

        let millis = Utc::now().timestamp_millis();
        LoginPayload {
            tokens: AuthTokens {
                access_token: format!("mock_access_token_{millis}"),
                refresh_token: Some(format!("mock_refresh_token_{millis}")),
            },
            user: UserProfile {
                id: format!("user_{}", random_suffix(9)),
                whatsapp_number: Some(compose_phone_number(identifier, country_code)),
                status: Some("active".to_string()),
                extra: Default::default(),
            },
        }
    }
}

/// Lowercase hex drawn from the random tail of a v7 UUID.
fn random_suffix(len: usize) -> String {
    let simple = Uuid::now_v7().simple().to_string();
    simple[simple.len().saturating_sub(len)..].to_string()
}
