use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkylensError {
    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The structured failure surfaced to the caller when a run aborts. Partial
/// retrieval failures never produce one of these; they only under-count.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFailure {
    pub message: String,
    pub error: String,
}

impl From<&SkylensError> for ReportFailure {
    fn from(err: &SkylensError) -> Self {
        let message = match err {
            SkylensError::Resolution(_) => "Could not resolve the account".to_string(),
            SkylensError::Retrieval(_) => "Could not retrieve account data".to_string(),
            SkylensError::Classification(_) => "Could not classify account data".to_string(),
            SkylensError::Other(_) => "Report generation failed".to_string(),
        };
        Self {
            message,
            error: err.to_string(),
        }
    }
}
