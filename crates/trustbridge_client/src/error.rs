use reqwest::StatusCode;
use thiserror::Error;
use trustbridge_contract::CodecError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("invalid endpoint {endpoint}: {source}")]
    Url {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected response from {endpoint}: {source}")]
    Codec {
        endpoint: String,
        #[source]
        source: CodecError,
    },
    #[error("local storage failure: {0:#}")]
    Storage(anyhow::Error),
}
