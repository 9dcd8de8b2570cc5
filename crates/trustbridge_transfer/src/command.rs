use thiserror::Error;

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const DEFAULT_COMMAND_CURRENCY: &str = "ADA";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recipient identifier is empty")]
    EmptyRecipient,
    #[error("invalid wallet ID format: {0}")]
    InvalidRecipient(String),
    #[error("not a payment command: {0}")]
    NotAPaymentCommand(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientId {
    /// International phone number, `+` followed by digits only.
    Phone(String),
    CardanoAddress(String),
}

impl RecipientId {
    pub fn as_str(&self) -> &str {
        match self {
            RecipientId::Phone(value) | RecipientId::CardanoAddress(value) => value,
        }
    }
}

/// Checks a recipient typed by the user before anything is sent.
pub fn validate_recipient(raw: &str) -> Result<RecipientId, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyRecipient);
    }

    if let Some(rest) = trimmed
        .strip_prefix("addr_test1")
        .or_else(|| trimmed.strip_prefix("addr1"))
    {
        let valid = rest.len() >= 50 && rest.chars().all(|c| BECH32_CHARSET.contains(c));
        return if valid {
            Ok(RecipientId::CardanoAddress(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidRecipient(trimmed.to_string()))
        };
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    match compact.strip_prefix('+') {
        Some(digits)
            if (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            Ok(RecipientId::Phone(compact))
        }
        _ => Err(ValidationError::InvalidRecipient(trimmed.to_string())),
    }
}

/// A chat message such as `/pay 50 USD` or `send 25 ada`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCommand {
    pub amount: f64,
    pub currency: String,
}

impl PaymentCommand {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let verb_at = tokens
            .iter()
            .position(|token| {
                let word = token.trim_start_matches('/').to_ascii_lowercase();
                word == "pay" || word == "send"
            })
            .ok_or_else(|| ValidationError::NotAPaymentCommand(text.to_string()))?;

        let amount_token = tokens
            .get(verb_at + 1)
            .ok_or_else(|| ValidationError::NotAPaymentCommand(text.to_string()))?;

        let split = amount_token
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(amount_token.len());
        let (number, suffix) = amount_token.split_at(split);
        let amount = parse_amount(number)?;

        let currency_token = if suffix.is_empty() {
            tokens.get(verb_at + 2).copied()
        } else {
            Some(suffix)
        };
        let currency = currency_token
            .filter(|token| token.len() == 3 && token.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| DEFAULT_COMMAND_CURRENCY.to_string());

        Ok(Self { amount, currency })
    }
}

fn parse_amount(number: &str) -> Result<f64, ValidationError> {
    let well_formed = !number.is_empty()
        && !number.starts_with('.')
        && !number.ends_with('.')
        && number.matches('.').count() <= 1;
    if !well_formed {
        return Err(ValidationError::InvalidAmount(number.to_string()));
    }
    number
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidAmount(number.to_string()))
}
