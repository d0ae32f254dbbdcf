//! Validated token endpoint responses
//!
//! Required fields are checked by serde on receipt. Everything else the
//! provider returns is collected in `extra`, so nothing downstream can come
//! to depend on a field that was never validated.

use common::Provider;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// CRM token response for both code exchange and refresh.
///
/// `expires_in` is a delta in seconds from the response time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrmGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Workspace the messaging token was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Messaging token response from the code exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagingGrant {
    pub access_token: String,
    pub team: Team,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token material returned by a provider, tagged by provider kind.
#[derive(Debug, Clone)]
pub enum TokenGrant {
    Crm(CrmGrant),
    Messaging(MessagingGrant),
}

impl TokenGrant {
    pub fn provider(&self) -> Provider {
        match self {
            TokenGrant::Crm(_) => Provider::Hubspot,
            TokenGrant::Messaging(_) => Provider::Slack,
        }
    }

    pub fn access_token(&self) -> &str {
        match self {
            TokenGrant::Crm(grant) => &grant.access_token,
            TokenGrant::Messaging(grant) => &grant.access_token,
        }
    }

    /// Fields the provider sent that are not part of the validated shape.
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            TokenGrant::Crm(grant) => &grant.extra,
            TokenGrant::Messaging(grant) => &grant.extra,
        }
    }
}
