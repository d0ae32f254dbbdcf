//! Session payload

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key holding the CRM account (portal) id.
pub const HUBSPOT_PORTAL_ID: &str = "hubspotPortalId";

/// Key holding the messaging team id.
pub const SLACK_TEAM_ID: &str = "slackTeamId";

/// Provider-scoped identifiers carried by a session.
///
/// Every key is optional and independent. Payloads are values: updates
/// produce a new payload instead of mutating one that is already in use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionPayload(BTreeMap<String, String>);

impl SessionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this payload with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn hubspot_portal_id(&self) -> Option<&str> {
        self.get(HUBSPOT_PORTAL_ID)
    }

    pub fn slack_team_id(&self) -> Option<&str> {
        self.get(SLACK_TEAM_ID)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SessionPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
