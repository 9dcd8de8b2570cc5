pub mod auth;
pub mod codec;
pub mod envelope;
pub mod invoice;
pub mod market;
pub mod mode;

pub use auth::{
    compose_phone_number, AuthTokens, Credentials, LoginPayload, LoginRequest, LoginResult,
    UserProfile,
};
pub use codec::{decode_envelope, unwrap_envelope, CodecError};
pub use envelope::{ApiResponse, DataSource, Fetched};
pub use invoice::{invoice_file_name, InvoiceDocument, INVOICE_CONTENT_TYPE};
pub use market::{
    AssetQuantity, BackendWalletInfo, CardanoToken, CurrencyShare, DailyActivity, ExchangeRate,
    TokenStats, TokenWithStats, TransactionStats, WalletBalance,
};
pub use mode::{DemoBanner, DemoIndicator, DEMO_BANNER_TEXT, DEMO_BANNER_TITLE};
