//! Session codec: signed, time-bounded session tokens
//!
//! Sessions are HS256 JWTs. `exp` and `iat` belong to the envelope, not the
//! payload: they are stripped from the payload before signing and from the
//! claims after decoding, so a decoded session can be merged and re-issued
//! without carrying the old expiry along.
//!
//! Expiry is checked against an explicit instant with zero leeway. Reading a
//! session never extends it; only `issue` produces a new window. `exp` is
//! whole seconds, rounded up, so a session issued mid-second stays valid for
//! at least the full window.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use common::Secret;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};

use crate::payload::SessionPayload;

/// Claim names owned by the envelope. Never part of a payload.
pub const RESERVED_CLAIMS: &[&str] = &["exp", "iat", "nbf"];

/// Validity window applied to every issued session, in days.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

/// Why an incoming session was discarded. Only used for logs and metrics:
/// every variant means "treat the caller as anonymous".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionInvalid {
    #[error("no session token")]
    Missing,
    #[error("malformed session token")]
    Malformed,
    #[error("session token expired")]
    Expired,
    #[error("session token signature mismatch")]
    BadSignature,
}

impl SessionInvalid {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            SessionInvalid::Missing => "missing",
            SessionInvalid::Malformed => "malformed",
            SessionInvalid::Expired => "expired",
            SessionInvalid::BadSignature => "signature",
        }
    }
}

/// Failure to produce a session token.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to sign session: {0}")]
    Sign(String),
    #[error("session validity window out of range")]
    WindowOutOfRange,
}

pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: TimeDelta,
}

impl SessionCodec {
    pub fn new(secret: &Secret<String>, validity: TimeDelta) -> Self {
        let key = secret.expose().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validity,
        }
    }

    pub fn validity(&self) -> TimeDelta {
        self.validity
    }

    /// Sign `payload` with a validity window starting now.
    pub fn issue(&self, payload: &SessionPayload) -> Result<String, CodecError> {
        self.issue_at(payload, Utc::now())
    }

    /// Sign `payload` with a validity window starting at `now`.
    pub fn issue_at(&self, payload: &SessionPayload, now: DateTime<Utc>) -> Result<String, CodecError> {
        let issued_at = now.timestamp();
        let expires = now
            .checked_add_signed(self.validity)
            .ok_or(CodecError::WindowOutOfRange)?;
        let expires_at = if expires.timestamp_subsec_nanos() > 0 {
            expires.timestamp() + 1
        } else {
            expires.timestamp()
        };

        let mut claims: BTreeMap<String, Value> = payload
            .iter()
            .filter(|(key, _)| !RESERVED_CLAIMS.contains(key))
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        claims.insert("iat".into(), Value::from(issued_at));
        claims.insert("exp".into(), Value::from(expires_at));

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CodecError::Sign(e.to_string()))
    }

    /// Verify and decode a session token as of now.
    pub fn decode(&self, token: &str) -> Result<SessionPayload, SessionInvalid> {
        self.decode_at(token, Utc::now())
    }

    /// Verify and decode a session token as of `now`.
    ///
    /// Reserved claims are removed and non-string claims are dropped, so the
    /// result is always a plain payload.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionPayload, SessionInvalid> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionInvalid::Missing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Map<String, Value>>(token, &self.decoding, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => SessionInvalid::BadSignature,
                ErrorKind::ExpiredSignature => SessionInvalid::Expired,
                _ => SessionInvalid::Malformed,
            },
        )?;

        let expires_at = data
            .claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(SessionInvalid::Malformed)?;
        if now.timestamp() >= expires_at {
            return Err(SessionInvalid::Expired);
        }

        Ok(data
            .claims
            .into_iter()
            .filter(|(key, _)| !RESERVED_CLAIMS.contains(&key.as_str()))
            .filter_map(|(key, value)| match value {
                Value::String(text) => Some((key, text)),
                _ => None,
            })
            .collect())
    }
}
