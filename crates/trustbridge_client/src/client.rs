use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use trustbridge_contract::{
    decode_envelope, BackendWalletInfo, ExchangeRate, Fetched, InvoiceDocument, TokenWithStats,
    TransactionStats,
};
use trustbridge_mock::MockApiService;
use trustbridge_storage::{AuthHeaders, CredentialStore};
use trustbridge_transfer::{
    CalculateTransferRequest, ConfirmPaymentRequest, HistoryQuery, PaymentConfirmation,
    PaymentMethod, StatusTransition, TransactionHistory, TransferCalculation, TransferDetails,
    TransferHistory, TransferInitiation, TransferRequest, TransferStatus, TransferStatusReport,
    UserTransferStats,
};
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const STATS_HISTORY_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, ClientError> {
        let url = Url::parse(base_url).map_err(|source| ClientError::Url {
            endpoint: base_url.to_string(),
            source,
        })?;
        Ok(Self::new(url))
    }
}

/// Backend client that never leaves the caller without data.
///
/// Each operation tries the backend first. When the call fails for any
/// reason the matching [`MockApiService`] answer is returned instead, tagged
/// [`Fetched::Simulated`], and [`ApiClient::is_demo_mode`] turns on until the
/// next successful live call.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: CredentialStore,
    mock: MockApiService,
    demo_mode: AtomicBool,
    status_watermarks: Mutex<HashMap<String, TransferStatus>>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        credentials: CredentialStore,
        mock: MockApiService,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            config,
            credentials,
            mock,
            demo_mode: AtomicBool::new(false),
            status_watermarks: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn mock(&self) -> &MockApiService {
        &self.mock
    }

    /// Whether the most recent backend call fell back to demo data.
    ///
    /// Concurrent calls race on this flag; use the [`Fetched`] tag when the
    /// provenance of one particular result matters.
    pub fn is_demo_mode(&self) -> bool {
        self.demo_mode.load(Ordering::SeqCst)
    }

    pub async fn calculate_transfer(
        &self,
        payment_method: PaymentMethod,
        sender_currency: &str,
        amount: f64,
        recipient_currency: &str,
    ) -> Fetched<TransferCalculation> {
        let body = CalculateTransferRequest {
            payment_method: payment_method.clone(),
            sender_currency: sender_currency.to_string(),
            amount,
            recipient_currency: recipient_currency.to_string(),
        };
        self.with_fallback(
            "calculate_transfer",
            self.request(Method::POST, "/api/transfer/calculate", &[], Some(&body)),
            self.mock
                .calculate_transfer(&payment_method, sender_currency, amount, recipient_currency),
        )
        .await
    }

    pub async fn initiate_transfer(
        &self,
        request: &TransferRequest,
    ) -> Fetched<TransferInitiation> {
        self.with_fallback(
            "initiate_transfer",
            self.request(Method::POST, "/api/transfer/initiate", &[], Some(request)),
            self.mock.initiate_transfer(request),
        )
        .await
    }

    pub async fn confirm_payment(
        &self,
        transfer_id: &str,
        tx_hash: &str,
    ) -> Fetched<PaymentConfirmation> {
        let body = ConfirmPaymentRequest {
            transfer_id: transfer_id.to_string(),
            tx_hash: tx_hash.to_string(),
        };
        self.with_fallback(
            "confirm_payment",
            self.request(Method::POST, "/api/transfer/confirm", &[], Some(&body)),
            self.mock.confirm_payment(transfer_id, tx_hash),
        )
        .await
    }

    pub async fn transfer_status(&self, transfer_id: &str) -> Fetched<TransferStatusReport> {
        let endpoint = format!("/api/transfer/status/{transfer_id}");
        let fetched = self
            .with_fallback(
                "transfer_status",
                self.request(Method::GET, &endpoint, &[], None::<&()>),
                self.mock.transfer_status(transfer_id),
            )
            .await;

        if let Fetched::Live(report) = &fetched {
            self.track_status(report);
        }
        fetched
    }

    /// Highest lifecycle status the backend has reported for `transfer_id`.
    pub fn last_known_status(&self, transfer_id: &str) -> Option<TransferStatus> {
        self.status_watermarks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(transfer_id)
            .cloned()
    }

    pub async fn transfer_details(&self, transfer_id: &str) -> Fetched<TransferDetails> {
        let endpoint = format!("/api/transfer/details/{transfer_id}");
        self.with_fallback(
            "transfer_details",
            self.request(Method::GET, &endpoint, &[], None::<&()>),
            self.mock.transfer_details(transfer_id),
        )
        .await
    }

    pub async fn transfer_history(&self, query: &HistoryQuery) -> Fetched<TransferHistory> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(number) = self.whatsapp_number().await {
            params.push(("whatsappNumber", number));
        }
        if let Some(status) = &query.status {
            params.push(("status", status.clone()));
        }
        if let Some(method) = &query.payment_method {
            params.push(("paymentMethod", method.clone()));
        }

        let live = async {
            let mut history: TransferHistory = self
                .request(Method::GET, "/api/transfer/history", &params, None::<&()>)
                .await?;
            history.normalize_has_more();
            Ok::<_, ClientError>(history)
        };

        self.with_fallback(
            "transfer_history",
            live,
            self.mock.transfer_history(query.limit, query.offset),
        )
        .await
    }

    pub async fn transaction_history(&self, limit: u32) -> Fetched<TransactionHistory> {
        let params = [("limit", limit.to_string())];
        self.with_fallback(
            "transaction_history",
            self.request(Method::GET, "/api/transactions/history", &params, None::<&()>),
            self.mock.transaction_history(limit),
        )
        .await
    }

    pub async fn transaction_stats(&self) -> Fetched<TransactionStats> {
        self.with_fallback(
            "transaction_stats",
            self.request(
                Method::GET,
                "/api/transactions/stats/summary",
                &[],
                None::<&()>,
            ),
            self.mock.transaction_stats(),
        )
        .await
    }

    /// Per-user aggregates computed from the caller's transfer history.
    pub async fn user_stats(&self) -> Fetched<UserTransferStats> {
        self.transfer_history(&HistoryQuery::page(STATS_HISTORY_LIMIT, 0))
            .await
            .map(|history| UserTransferStats::from_history(&history.transfers))
    }

    pub async fn download_invoice(&self, transfer_id: &str) -> Fetched<InvoiceDocument> {
        let endpoint = format!("/api/transfer/invoice/{transfer_id}");
        let live = async {
            let bytes = self.fetch_bytes(&endpoint).await?;
            Ok::<_, ClientError>(InvoiceDocument::pdf(transfer_id, bytes))
        };
        self.with_fallback(
            "download_invoice",
            live,
            self.mock.download_invoice(transfer_id),
        )
        .await
    }

    pub async fn backend_info(&self) -> Fetched<BackendWalletInfo> {
        self.with_fallback(
            "backend_info",
            self.request(Method::GET, "/api/cardano/backend-info", &[], None::<&()>),
            self.mock.backend_info(),
        )
        .await
    }

    pub async fn exchange_rates(&self) -> Fetched<Vec<ExchangeRate>> {
        self.with_fallback(
            "exchange_rates",
            self.request(Method::GET, "/api/exchange/rates", &[], None::<&()>),
            self.mock.exchange_rates(),
        )
        .await
    }

    pub async fn cardano_tokens(&self) -> Fetched<Vec<TokenWithStats>> {
        self.with_fallback(
            "cardano_tokens",
            self.request(Method::GET, "/api/cardano/tokens", &[], None::<&()>),
            self.mock.cardano_tokens(),
        )
        .await
    }

    /// Sends one JSON call and unwraps the response envelope.
    pub(crate) async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let outcome = match self.send(method, endpoint, query, body).await {
            Ok(bytes) => decode_envelope(&bytes).map_err(|source| ClientError::Codec {
                endpoint: endpoint.to_string(),
                source,
            }),
            Err(error) => Err(error),
        };
        self.record_outcome(outcome)
    }

    async fn fetch_bytes(&self, endpoint: &str) -> Result<Vec<u8>, ClientError> {
        let outcome = self.send(Method::GET, endpoint, &[], None::<&()>).await;
        self.record_outcome(outcome)
    }

    fn record_outcome<T>(&self, outcome: Result<T, ClientError>) -> Result<T, ClientError> {
        self.demo_mode.store(outcome.is_err(), Ordering::SeqCst);
        outcome
    }

    async fn send<B>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Vec<u8>, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint)?;
        let headers = self.auth_headers().await;
        let authorized = !headers.is_empty();

        debug!(method = %method, endpoint = %endpoint, authorized, "backend request");
        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let transport = |source| ClientError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?.to_vec();

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED && authorized {
                self.expire_session().await;
            }
            return Err(ClientError::Http {
                endpoint: endpoint.to_string(),
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        let mut base = self.config.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(endpoint.trim_start_matches('/'))
            .map_err(|source| ClientError::Url {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    async fn auth_headers(&self) -> AuthHeaders {
        self.credentials.auth_headers().await.unwrap_or_else(|error| {
            warn!(error = %error, "credential store unreadable, sending unauthenticated request");
            AuthHeaders::new()
        })
    }

    async fn whatsapp_number(&self) -> Option<String> {
        match self.credentials.user().await {
            Ok(user) => user.and_then(|user| user.whatsapp_number),
            Err(error) => {
                warn!(error = %error, "failed to read stored user");
                None
            }
        }
    }

    async fn expire_session(&self) {
        info!("backend rejected the stored session, clearing credentials");
        if let Err(error) = self.credentials.clear_auth().await {
            warn!(error = %error, "failed to clear stale credentials");
        }
    }

    fn track_status(&self, report: &TransferStatusReport) {
        let mut marks = self
            .status_watermarks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = marks.get(&report.transfer_id).cloned();
        let transition = match &previous {
            Some(previous) => previous.transition_to(&report.status),
            None if report.status.rank().is_some() => StatusTransition::Advance,
            None => StatusTransition::Unranked,
        };
        match transition {
            StatusTransition::Advance => {
                marks.insert(report.transfer_id.clone(), report.status.clone());
            }
            StatusTransition::Unranked => {
                debug!(
                    transfer_id = %report.transfer_id,
                    reported = %report.status,
                    "unrecognised transfer status, keeping last known"
                );
            }
            StatusTransition::Regression => {
                warn!(
                    transfer_id = %report.transfer_id,
                    previous = ?previous,
                    reported = %report.status,
                    "backend reported a transfer status regression"
                );
            }
        }
    }

    async fn with_fallback<T, L, M>(&self, operation: &'static str, live: L, mock: M) -> Fetched<T>
    where
        L: Future<Output = Result<T, ClientError>>,
        M: Future<Output = T>,
    {
        match live.await {
            Ok(value) => Fetched::Live(value),
            Err(error) => {
                warn!(operation, error = %error, "backend unavailable, serving demo data");
                Fetched::Simulated(mock.await)
            }
        }
    }
}
