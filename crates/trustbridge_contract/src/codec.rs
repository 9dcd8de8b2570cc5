use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::envelope::ApiResponse;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode response envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("backend rejected request: {0}")]
    Rejected(String),
    #[error("response envelope carried no data")]
    MissingData,
}

/// Decodes an `ApiResponse<T>` body and unwraps its payload.
pub fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let envelope: ApiResponse<T> = serde_json::from_slice(bytes).map_err(CodecError::Envelope)?;
    unwrap_envelope(envelope)
}

pub fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, CodecError> {
    if !envelope.success {
        let reason = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| "unspecified error".to_string());
        return Err(CodecError::Rejected(reason));
    }
    envelope.data.ok_or(CodecError::MissingData)
}
