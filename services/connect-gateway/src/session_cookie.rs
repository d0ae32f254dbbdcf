//! Session transport over a cookie
//!
//! `CallerSession` never rejects a request. A missing, malformed, expired or
//! tampered cookie all read as "no session", which is indistinguishable from
//! a caller who never connected anything.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use chrono::TimeDelta;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use session::SessionPayload;
use tracing::debug;

use crate::metrics;
use crate::state::AppState;

/// How the session cookie is written.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub max_age_secs: i64,
    /// `Secure` + `SameSite=None` when set. Browsers drop `SameSite=None`
    /// cookies that are not `Secure`, so plain-http development uses `Lax`.
    pub production: bool,
}

impl CookieSettings {
    pub fn new(name: impl Into<String>, validity: TimeDelta, production: bool) -> Self {
        Self {
            name: name.into(),
            max_age_secs: validity.num_seconds(),
            production,
        }
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn set_cookie(&self, token: &str) -> String {
        let same_site = if self.production {
            SameSite::None
        } else {
            SameSite::Lax
        };
        Cookie::build((self.name.clone(), token.to_owned()))
            .path("/")
            .max_age(Duration::seconds(self.max_age_secs))
            .http_only(true)
            .secure(self.production)
            .same_site(same_site)
            .build()
            .to_string()
    }
}

/// Value of the cookie called `name`, if the request carries one.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|parsed| parsed.ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
}

/// The decoded session on the incoming request, if any.
#[derive(Debug, Clone, Default)]
pub struct CallerSession(pub Option<SessionPayload>);

impl CallerSession {
    pub fn payload(&self) -> Option<&SessionPayload> {
        self.0.as_ref()
    }

    pub fn hubspot_portal_id(&self) -> Option<&str> {
        self.0.as_ref().and_then(SessionPayload::hubspot_portal_id)
    }
}

impl FromRequestParts<AppState> for CallerSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = read_cookie(&parts.headers, &state.cookie.name) else {
            return Ok(Self(None));
        };

        match state.sessions.decode(&token) {
            Ok(payload) => Ok(Self(Some(payload))),
            Err(invalid) => {
                debug!(reason = invalid.reason(), "discarding session cookie");
                metrics::record_session_rejection(invalid.reason());
                Ok(Self(None))
            }
        }
    }
}
