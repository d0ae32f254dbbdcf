//! Stored token and rule shapes

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// When a token record was created.
///
/// Documents written by other tools (or older versions of this service) carry
/// the timestamp either as a native timestamp or as an ISO-8601 string. All
/// forms normalize to the same instant through `instant()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    /// Unix timestamp in milliseconds
    Millis(i64),
    /// Document-store timestamp object (`{seconds, nanos}`)
    Timestamp {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanos: u32,
    },
    /// ISO-8601 / RFC 3339 string
    Iso(String),
}

impl CreatedAt {
    /// Record an instant in the canonical form written by this service.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        CreatedAt::Iso(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Normalize to a UTC instant.
    pub fn instant(&self) -> Result<DateTime<Utc>> {
        match self {
            CreatedAt::Millis(millis) => DateTime::from_timestamp_millis(*millis)
                .ok_or_else(|| Error::InvalidTimestamp(format!("{millis} ms out of range"))),
            CreatedAt::Timestamp { seconds, nanos } => DateTime::from_timestamp(*seconds, *nanos)
                .ok_or_else(|| Error::InvalidTimestamp(format!("{seconds}s {nanos}ns out of range"))),
            CreatedAt::Iso(text) => parse_iso(text),
        }
    }
}

fn parse_iso(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    // No offset: treat as UTC
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::InvalidTimestamp(format!("{text:?}: {e}")))
}

/// Workspace a messaging token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Latest token material for one `(account, provider)` pair.
///
/// `expires_in` is the lifetime in seconds counted from `created_at`. Records
/// without it (messaging tokens) never go stale.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    pub created_at: CreatedAt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamRef>,
}

impl TokenRecord {
    /// Absolute expiry, or `None` for a non-expiring token.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(expires_in) = self.expires_in else {
            return Ok(None);
        };
        let created = self.created_at.instant()?;
        let lifetime = TimeDelta::try_seconds(expires_in as i64)
            .ok_or_else(|| Error::InvalidTimestamp(format!("expires_in {expires_in} too large")))?;
        Ok(created.checked_add_signed(lifetime))
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("created_at", &self.created_at)
            .field("team", &self.team)
            .finish()
    }
}

/// Notification rules for one account: an ordered list of opaque strings,
/// replaced wholesale on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRules {
    pub rules: Vec<String>,
    pub updated_at: DateTime<Utc>,
}
