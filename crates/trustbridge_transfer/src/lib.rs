pub mod command;
pub mod model;
pub mod stats;
pub mod status;

pub use command::{validate_recipient, PaymentCommand, RecipientId, ValidationError};
pub use model::{
    round2, BlockchainQuote, BlockchainTransaction, CalculateTransferRequest,
    ConfirmPaymentRequest, DetailsBlockchain, Fee, HistoryBlockchain, HistoryQuery,
    PaymentConfirmation, PaymentMethod, RecipientSummary, SenderSummary, StatusTimelineEntry,
    TransactionHistory, TransactionItem, TransferCalculation, TransferDetails, TransferHistory,
    TransferHistoryItem, TransferId, TransferInitiation, TransferRequest, TransferStatusReport,
};
pub use stats::UserTransferStats;
pub use status::{StatusTransition, TransferStatus};
