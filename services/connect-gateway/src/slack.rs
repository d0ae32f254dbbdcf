//! Messaging connection flow: redirect, callback, status, disconnect
//!
//! A messaging token is filed under the CRM account id from the caller's
//! session. Without one the callback is rejected before the code is
//! exchanged, so nothing is consumed and nothing is written.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use common::Provider;
use serde_json::json;
use session::{SLACK_TEAM_ID, SessionPayload, merge};
use tracing::{info, warn};

use crate::connection::{CallbackParams, connection_status};
use crate::error::{Error, Result};
use crate::metrics;
use crate::reply;
use crate::session_cookie::CallerSession;
use crate::state::AppState;

/// GET /slack/auth
pub async fn auth(State(state): State<AppState>) -> Response {
    reply::redirect(state.slack.authorization_url())
}

/// GET /slack/callback
pub async fn callback(
    State(state): State<AppState>,
    session: CallerSession,
    query: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let params = CallbackParams::from_query(query, Provider::Slack);
    let Some(code) = params.code(Provider::Slack) else {
        return reply::json(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Missing Slack authorization code" }),
        );
    };

    let Some(portal_id) = session.hubspot_portal_id() else {
        metrics::record_callback(Provider::Slack, "not_linked");
        warn!(provider = "slack", "messaging connect attempted without a CRM account");
        return reply::json(
            StatusCode::BAD_REQUEST,
            json!({ "message": "You must connect HubSpot before connecting Slack" }),
        );
    };

    match connect(&state, &session, portal_id, code).await {
        Ok((team_id, cookie)) => {
            metrics::record_callback(Provider::Slack, "success");
            info!(provider = "slack", account_id = portal_id, team_id = %team_id, "messaging workspace connected");
            reply::json_with_cookie(
                StatusCode::OK,
                json!({ "message": "Slack connected successfully" }),
                cookie,
            )
        }
        Err(e) => {
            metrics::record_callback(Provider::Slack, "failure");
            warn!(provider = "slack", account_id = portal_id, error = %e, "messaging connection failed");
            reply::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "SLACK_AUTH_FAILED" }),
            )
        }
    }
}

/// Exchange, persist under the CRM account, then re-issue the session.
/// Returns the team id and the `Set-Cookie` value.
async fn connect(
    state: &AppState,
    session: &CallerSession,
    portal_id: &str,
    code: &str,
) -> Result<(String, String)> {
    let record = state.slack.exchange_for_tokens(code).await?;
    let team_id = record
        .team
        .as_ref()
        .map(|team| team.id.clone())
        .ok_or(Error::MissingTeam)?;
    state.slack.save(portal_id, record).await?;

    let updates = SessionPayload::new().with(SLACK_TEAM_ID, team_id.clone());
    let token = state.sessions.issue(&merge(session.payload(), &updates))?;
    Ok((team_id, state.cookie.set_cookie(&token)))
}

/// GET /slack/status
pub async fn status(State(state): State<AppState>, session: CallerSession) -> Response {
    connection_status(&state, &session, Provider::Slack).await
}

/// DELETE /slack/connection
///
/// Deletes the stored messaging token. The session keeps its team id; status
/// reads the store, so it reports `connected: false` from here on.
pub async fn disconnect(State(state): State<AppState>, session: CallerSession) -> Response {
    let Some(portal_id) = session.hubspot_portal_id() else {
        return reply::json(
            StatusCode::BAD_REQUEST,
            json!({ "message": "No HubSpot portal context found" }),
        );
    };

    match state.store.delete_token(portal_id, Provider::Slack).await {
        Ok(removed) => {
            info!(provider = "slack", account_id = portal_id, removed, "messaging workspace disconnected");
            reply::json(
                StatusCode::OK,
                json!({ "message": "Slack disconnected", "removed": removed }),
            )
        }
        Err(e) => {
            warn!(provider = "slack", account_id = portal_id, error = %e, "disconnect failed");
            reply::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "DISCONNECT_FAILED" }),
            )
        }
    }
}
