use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a transfer as reported by the backend.
///
/// Known values move forward only:
/// `INITIATED -> PAYMENT_CONFIRMED -> MINTED_<TOKEN> -> PROCESSING -> COMPLETED`,
/// with `FAILED` and `CANCELLED` reachable from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransferStatus {
    Initiated,
    PaymentConfirmed,
    /// Hub or recipient token minted; carries the token suffix, e.g. `MOCKADA`.
    Minted(String),
    Processing,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl TransferStatus {
    pub fn rank(&self) -> Option<u8> {
        match self {
            TransferStatus::Initiated => Some(0),
            TransferStatus::PaymentConfirmed => Some(1),
            TransferStatus::Minted(_) => Some(2),
            TransferStatus::Processing => Some(3),
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled => {
                Some(4)
            }
            TransferStatus::Other(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }

    /// Classifies a report of `next` against `self`, the highest status
    /// already recorded for the same transfer.
    pub fn transition_to(&self, next: &TransferStatus) -> StatusTransition {
        if self == next {
            return StatusTransition::Advance;
        }
        let Some(candidate) = next.rank() else {
            return StatusTransition::Unranked;
        };
        let Some(current) = self.rank() else {
            return StatusTransition::Advance;
        };
        if self.is_terminal() {
            return StatusTransition::Regression;
        }
        if matches!(next, TransferStatus::Failed | TransferStatus::Cancelled)
            || candidate >= current
        {
            StatusTransition::Advance
        } else {
            StatusTransition::Regression
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    /// Unrecognised statuses are never treated as a regression, from any state.
    pub fn can_advance_to(&self, next: &TransferStatus) -> bool {
        self.transition_to(next) != StatusTransition::Regression
    }
}

/// Outcome of comparing a reported status with the highest one seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// `next` ranks at least as high, or is a failure from a live state.
    Advance,
    /// `next` is not a lifecycle value; it neither advances nor regresses.
    Unranked,
    Regression,
}

impl From<String> for TransferStatus {
    fn from(raw: String) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "INITIATED" => TransferStatus::Initiated,
            "PAYMENT_CONFIRMED" => TransferStatus::PaymentConfirmed,
            "PROCESSING" => TransferStatus::Processing,
            "COMPLETED" => TransferStatus::Completed,
            "FAILED" => TransferStatus::Failed,
            "CANCELLED" => TransferStatus::Cancelled,
            _ => match upper.strip_prefix("MINTED_") {
                Some(token) if !token.is_empty() => TransferStatus::Minted(token.to_string()),
                _ => TransferStatus::Other(raw),
            },
        }
    }
}

impl From<TransferStatus> for String {
    fn from(status: TransferStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStatus::Initiated => f.write_str("INITIATED"),
            TransferStatus::PaymentConfirmed => f.write_str("PAYMENT_CONFIRMED"),
            TransferStatus::Minted(token) => write!(f, "MINTED_{token}"),
            TransferStatus::Processing => f.write_str("PROCESSING"),
            TransferStatus::Completed => f.write_str("COMPLETED"),
            TransferStatus::Failed => f.write_str("FAILED"),
            TransferStatus::Cancelled => f.write_str("CANCELLED"),
            TransferStatus::Other(raw) => f.write_str(raw),
        }
    }
}
