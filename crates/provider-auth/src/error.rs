//! Error types for provider token operations

use common::Provider;

use crate::failure::ProviderFailure;

/// Errors from provider token and account calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request to {provider} failed: {message}")]
    Http { provider: Provider, message: String },

    #[error("{provider} rejected the request: {failure}")]
    Rejected {
        provider: Provider,
        failure: ProviderFailure,
    },

    #[error("invalid {provider} response: {message}")]
    InvalidResponse { provider: Provider, message: String },

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: Provider,
        operation: &'static str,
    },

    #[error("invalid {provider} endpoint {url}: {message}")]
    Endpoint {
        provider: Provider,
        url: String,
        message: String,
    },
}

impl Error {
    /// Provider the failing call was made against.
    pub fn provider(&self) -> Provider {
        match self {
            Error::Http { provider, .. }
            | Error::Rejected { provider, .. }
            | Error::InvalidResponse { provider, .. }
            | Error::Unsupported { provider, .. }
            | Error::Endpoint { provider, .. } => *provider,
        }
    }

    /// The classified provider failure, when the provider answered with one.
    pub fn failure(&self) -> Option<&ProviderFailure> {
        match self {
            Error::Rejected { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;
