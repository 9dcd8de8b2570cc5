use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Backend fields this client does not interpret, kept so a stored
    /// profile round-trips without loss.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub whatsapp_number: String,
    pub country_code: String,
}

/// `data` member of a successful login response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginPayload {
    pub tokens: AuthTokens,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub success: bool,
    pub tokens: AuthTokens,
    pub user: UserProfile,
    pub message: Option<String>,
}

impl LoginResult {
    pub fn from_payload(payload: LoginPayload, message: Option<String>) -> Self {
        Self {
            success: true,
            tokens: payload.tokens,
            user: payload.user,
            message,
        }
    }
}

/// Joins a country code and a local number into one international number.
///
/// Spaces, dashes and parentheses are dropped, and the local part loses a
/// duplicate leading `+`, so `+62` and `812 345` become `+62812345`. Other
/// digits, including a leading `0`, are kept as typed.
pub fn compose_phone_number(identifier: &str, country_code: &str) -> String {
    let digits = |raw: &str| -> String {
        raw.chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect()
    };

    let code = digits(country_code);
    let local = digits(identifier);
    let local = local.trim_start_matches('+');

    if code.is_empty() {
        return local.to_string();
    }
    if code.starts_with('+') {
        format!("{code}{local}")
    } else {
        format!("+{code}{local}")
    }
}

#[cfg(test)]
mod tests {
    use super::{compose_phone_number, UserProfile};

    #[test]
    fn composes_international_numbers() {
        assert_eq!(compose_phone_number("812-3456-7890", "+62"), "+6281234567890");
        assert_eq!(compose_phone_number("+812 345", "62"), "+62812345");
        assert_eq!(compose_phone_number("0812 345", "+62"), "+620812345");
        assert_eq!(compose_phone_number("5551234", ""), "5551234");
    }

    #[test]
    fn unknown_profile_fields_are_preserved() {
        let raw = r#"{"id":"u1","whatsappNumber":"+1555","status":"active","tier":"gold"}"#;
        let user: UserProfile = serde_json::from_str(raw).expect("decode");
        assert_eq!(user.whatsapp_number.as_deref(), Some("+1555"));
        assert_eq!(user.extra.get("tier").and_then(|v| v.as_str()), Some("gold"));

        let encoded = serde_json::to_value(&user).expect("encode");
        assert_eq!(encoded["tier"], "gold");
    }
}
