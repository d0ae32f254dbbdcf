//! Connection flow errors
//!
//! Handlers never return these to the browser. Each flow step returns
//! `Result<_, Error>` and the handler logs the error and answers with the
//! route's fixed failure body.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Token(#[from] token_lifecycle::Error),

    #[error(transparent)]
    Provider(#[from] provider_auth::Error),

    #[error(transparent)]
    Store(#[from] credential_store::Error),

    #[error(transparent)]
    Session(#[from] session::CodecError),

    #[error("messaging token record carries no team")]
    MissingTeam,
}

/// Result alias using the flow Error
pub type Result<T> = std::result::Result<T, Error>;
