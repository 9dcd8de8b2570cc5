use serde::{Deserialize, Serialize};

/// Response envelope shared by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Simulated,
}

/// A result tagged with where it came from.
///
/// Both variants carry the same type, so a caller renders them identically
/// and only checks the tag when it wants to warn about simulated data.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Live(T),
    Simulated(T),
}

impl<T> Fetched<T> {
    pub fn source(&self) -> DataSource {
        match self {
            Fetched::Live(_) => DataSource::Live,
            Fetched::Simulated(_) => DataSource::Simulated,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Fetched::Simulated(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Fetched::Live(value) | Fetched::Simulated(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Live(value) | Fetched::Simulated(value) => value,
        }
    }

    pub fn map<U, F>(self, f: F) -> Fetched<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Fetched::Live(value) => Fetched::Live(f(value)),
            Fetched::Simulated(value) => Fetched::Simulated(f(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiResponse, DataSource, Fetched};

    #[test]
    fn envelope_without_data_decodes() {
        let parsed: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"success":false,"error":"boom"}"#).expect("decode");
        assert!(!parsed.success);
        assert!(parsed.data.is_none());
        assert_eq!(parsed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn map_keeps_provenance() {
        let fetched = Fetched::Simulated(2).map(|n| n * 10);
        assert_eq!(fetched.source(), DataSource::Simulated);
        assert_eq!(fetched.into_inner(), 20);
    }
}
