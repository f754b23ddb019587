//! Infrastructure error type and its mapping onto `ConsentError`

use consentflow_domain::ConsentError;
use thiserror::Error;

/// Failures raised by infrastructure adapters
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfraError> for ConsentError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Http(inner) if inner.is_builder() => Self::Config(inner.to_string()),
            InfraError::Http(inner) => Self::Network(format!("http request failed: {inner}")),
            InfraError::Io(inner) => Self::Network(format!("io failure: {inner}")),
            InfraError::Config(msg) => Self::Config(msg),
        }
    }
}
