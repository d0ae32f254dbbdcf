//! Error types for token lifecycle operations

use common::Provider;

/// Why a stale token could not be refreshed.
#[derive(Debug, thiserror::Error)]
pub enum RefreshFailure {
    #[error("no refresh token stored")]
    NoRefreshToken,

    #[error(transparent)]
    Provider(provider_auth::Error),
}

/// Errors from token lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no {provider} token stored for account {account_id}")]
    NotConnected {
        provider: Provider,
        account_id: String,
    },

    #[error("{provider} token refresh failed: {reason}")]
    RefreshFailed {
        provider: Provider,
        reason: RefreshFailure,
    },

    #[error("code exchange failed: {0}")]
    Exchange(provider_auth::Error),

    #[error("credential store error: {0}")]
    Store(#[from] credential_store::Error),
}

/// Result alias for token lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;
