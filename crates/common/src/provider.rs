//! Third-party OAuth providers a session can be linked to

use std::fmt;

use serde::{Deserialize, Serialize};

/// An OAuth provider the gateway connects accounts to.
///
/// `Hubspot` is the CRM; its portal id is the account key every other
/// provider's records are filed under. `Slack` is the messaging provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Hubspot,
    Slack,
}

impl Provider {
    /// Stable identifier used as a storage key and metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Hubspot => "hubspot",
            Provider::Slack => "slack",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
