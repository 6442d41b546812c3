use thiserror::Error;

use crate::catalog::error::CatalogError;
use crate::source::retry::RetryableError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid source locator: {0}")]
    InvalidLocator(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RetryableError for SourceError {
    fn http_status(&self) -> Option<u16> {
        match self {
            SourceError::Http { status, .. } => Some(*status),
            SourceError::NotFound(_) => Some(404),
            SourceError::RateLimited { .. } => Some(429),
            SourceError::InvalidLocator(_) => Some(400),
            SourceError::Network(e) => e.status().map(|s| s.as_u16()),
            SourceError::InvalidResponse(_) | SourceError::Catalog(_) => None,
        }
    }
}
