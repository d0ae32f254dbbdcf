//! Merged multi-provider session
//!
//! A session is a small map of provider-scoped identifiers (the CRM portal
//! id, the messaging team id) carried in one signed, time-bounded token.
//! Every provider connection re-issues the token: the new identifiers are
//! merged over whatever the request already carried and the result is
//! signed from scratch with a fresh validity window.
//!
//! Decoding never fails loudly. Any problem with the incoming token means
//! the caller is treated as anonymous.

pub mod codec;
pub mod merge;
pub mod payload;

pub use codec::{CodecError, DEFAULT_VALIDITY_DAYS, RESERVED_CLAIMS, SessionCodec, SessionInvalid};
pub use merge::merge;
pub use payload::{HUBSPOT_PORTAL_ID, SLACK_TEAM_ID, SessionPayload};
