//! Common types shared by the connect gateway crates

mod error;
mod provider;
mod secret;

pub use error::{Error, Result};
pub use provider::Provider;
pub use secret::Secret;
