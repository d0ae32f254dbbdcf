//! OAuth token clients for the CRM and messaging providers
//!
//! Wraps the two token endpoint interactions each provider supports
//! (authorization-code exchange and, for the CRM, refresh-token exchange)
//! behind the dyn-compatible `TokenClient` trait, so the lifecycle manager
//! and the HTTP flows never talk to reqwest directly.
//!
//! Every successful response is validated into a `TokenGrant` variant with
//! its required fields checked on receipt; anything else the provider sends
//! lands in the grant's `extra` bucket. Non-success responses are classified
//! into a `ProviderFailure` that keeps the status and the raw body for logs.

pub mod client;
pub mod constants;
pub mod error;
pub mod failure;
pub mod grant;
pub mod hubspot;
pub mod slack;

pub use client::{AccountLookup, BoxFuture, OAuthApp, TokenClient};
pub use error::{Error, Result};
pub use failure::{FailureDetail, ProviderFailure};
pub use grant::{CrmGrant, MessagingGrant, Team, TokenGrant};
pub use hubspot::{HubspotClient, HubspotEndpoints};
pub use slack::{SlackClient, SlackEndpoints};
