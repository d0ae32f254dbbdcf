//! CRM connection flow: redirect, callback, status
//!
//! The callback is the only place a CRM account id enters a session. The
//! account id comes from the account details call made with the freshly
//! exchanged token, not from anything the browser sent.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use common::Provider;
use serde_json::json;
use session::{HUBSPOT_PORTAL_ID, SessionPayload, merge};
use tracing::{info, warn};

use crate::connection::{CallbackParams, connection_status};
use crate::error::Result;
use crate::metrics;
use crate::reply;
use crate::session_cookie::CallerSession;
use crate::state::AppState;

/// GET /hubspot/auth
pub async fn auth(State(state): State<AppState>) -> Response {
    reply::redirect(state.hubspot.authorization_url())
}

/// GET /hubspot/callback
pub async fn callback(
    State(state): State<AppState>,
    session: CallerSession,
    query: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let params = CallbackParams::from_query(query, Provider::Hubspot);
    let Some(code) = params.code(Provider::Hubspot) else {
        return reply::json(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Missing authorization code from HubSpot." }),
        );
    };

    match connect(&state, &session, code).await {
        Ok((portal_id, cookie)) => {
            metrics::record_callback(Provider::Hubspot, "success");
            info!(provider = "hubspot", account_id = %portal_id, "CRM account connected");
            reply::json_with_cookie(
                StatusCode::OK,
                json!({ "message": "HubSpot Connected Successfully" }),
                cookie,
            )
        }
        Err(e) => {
            metrics::record_callback(Provider::Hubspot, "failure");
            warn!(provider = "hubspot", error = %e, "CRM connection failed");
            reply::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "HUBSPOT_AUTH_FAILED" }),
            )
        }
    }
}

/// Exchange, resolve the account, persist, then re-issue the session.
/// Returns the account id and the `Set-Cookie` value.
async fn connect(state: &AppState, session: &CallerSession, code: &str) -> Result<(String, String)> {
    let record = state.hubspot.exchange_for_tokens(code).await?;
    let portal_id = state.accounts.fetch_portal_id(&record.access_token).await?;
    state.hubspot.save(&portal_id, record).await?;

    let updates = SessionPayload::new().with(HUBSPOT_PORTAL_ID, portal_id.clone());
    let token = state.sessions.issue(&merge(session.payload(), &updates))?;
    Ok((portal_id, state.cookie.set_cookie(&token)))
}

/// GET /hubspot/status
pub async fn status(State(state): State<AppState>, session: CallerSession) -> Response {
    connection_status(&state, &session, Provider::Hubspot).await
}
