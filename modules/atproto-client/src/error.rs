use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtprotoError>;

#[derive(Debug, Error)]
pub enum AtprotoError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Handle did not resolve to a DID: {0}")]
    HandleNotFound(String),

    #[error("Unsupported DID method: {0}")]
    UnsupportedDid(String),

    #[error("No personal data server in DID document for {0}")]
    MissingPds(String),
}

impl From<reqwest::Error> for AtprotoError {
    fn from(err: reqwest::Error) -> Self {
        AtprotoError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AtprotoError {
    fn from(err: serde_json::Error) -> Self {
        AtprotoError::Parse(err.to_string())
    }
}
