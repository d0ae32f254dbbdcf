//! Classification of non-success provider responses
//!
//! A provider may answer a batch-style call with a multi-status response
//! (207, or the CRM's own 477) carrying an `errors` array with one entry per
//! failed item. That is kept apart from a plain failure so callers and logs
//! see the per-item breakdown. Single-token exchanges treat both as hard
//! failures; the distinction only matters for diagnostics.

use std::fmt;

use serde_json::Value;

use crate::constants::HUBSPOT_MULTI_STATUS;

/// Parsed detail of a failed provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureDetail {
    /// The whole call failed. `body` is the parsed JSON body, or the raw text
    /// as a JSON string when the body was not JSON.
    Full { body: Value },
    /// Multi-status outcome: some items failed, one entry per failed item.
    Partial { errors: Vec<Value> },
}

/// A non-success provider response, kept for server-side diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub status: u16,
    pub detail: FailureDetail,
    pub raw_body: String,
}

impl ProviderFailure {
    /// Classify a failed response from its status and raw body.
    pub fn classify(status: u16, raw_body: String) -> Self {
        let parsed: Option<Value> = serde_json::from_str(&raw_body).ok();

        let detail = match parsed {
            Some(Value::Object(mut map)) if is_multi_status(status) => {
                match map.remove("errors") {
                    Some(Value::Array(errors)) => FailureDetail::Partial { errors },
                    Some(other) => {
                        map.insert("errors".into(), other);
                        FailureDetail::Full {
                            body: Value::Object(map),
                        }
                    }
                    None => FailureDetail::Full {
                        body: Value::Object(map),
                    },
                }
            }
            Some(body) => FailureDetail::Full { body },
            None => FailureDetail::Full {
                body: Value::String(raw_body.clone()),
            },
        };

        Self {
            status,
            detail,
            raw_body,
        }
    }

    /// Whether this is a multi-status partial failure.
    pub fn is_partial(&self) -> bool {
        matches!(self.detail, FailureDetail::Partial { .. })
    }

    /// Per-item errors of a partial failure; empty for a full failure.
    pub fn item_errors(&self) -> &[Value] {
        match &self.detail {
            FailureDetail::Partial { errors } => errors,
            FailureDetail::Full { .. } => &[],
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            FailureDetail::Full { .. } => write!(f, "status {}: {}", self.status, self.raw_body),
            FailureDetail::Partial { errors } => write!(
                f,
                "status {}: partial failure, {} item(s) failed",
                self.status,
                errors.len()
            ),
        }
    }
}

fn is_multi_status(status: u16) -> bool {
    status == 207 || status == HUBSPOT_MULTI_STATUS
}
