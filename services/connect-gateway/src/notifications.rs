//! Notification rules for the session's CRM account
//!
//! Rules are opaque strings, stored in order and replaced wholesale.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::reply;
use crate::session_cookie::CallerSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RulesBody {
    rules: Vec<String>,
}

/// POST /notifications/rules
pub async fn save_rules(
    State(state): State<AppState>,
    session: CallerSession,
    body: Bytes,
) -> Response {
    let Some(portal_id) = session.hubspot_portal_id() else {
        warn!("rule save attempted without a CRM account in session");
        return reply::json(
            StatusCode::BAD_REQUEST,
            json!({ "message": "No HubSpot portal context found" }),
        );
    };

    let rules = match serde_json::from_slice::<RulesBody>(&body) {
        Ok(body) => body.rules,
        Err(e) => {
            warn!(account_id = portal_id, error = %e, "invalid rules body");
            return reply::json(
                StatusCode::BAD_REQUEST,
                json!({ "message": "Invalid rules format" }),
            );
        }
    };

    let count = rules.len();
    match state.store.put_rules(portal_id, rules).await {
        Ok(()) => {
            info!(account_id = portal_id, count, "notification rules saved");
            reply::json(
                StatusCode::OK,
                json!({ "message": "Rules saved successfully" }),
            )
        }
        Err(e) => {
            warn!(account_id = portal_id, error = %e, "failed to save notification rules");
            reply::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "RULE_SAVE_FAILED" }),
            )
        }
    }
}

/// GET /notifications/rules
pub async fn get_rules(State(state): State<AppState>, session: CallerSession) -> Response {
    let Some(portal_id) = session.hubspot_portal_id() else {
        return reply::json(StatusCode::OK, json!({ "rules": [] }));
    };

    match state.store.get_rules(portal_id).await {
        Ok(rules) => reply::json(StatusCode::OK, json!({ "rules": rules })),
        Err(e) => {
            warn!(account_id = portal_id, error = %e, "failed to fetch notification rules");
            reply::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "rules": [], "error": "RULE_FETCH_FAILED" }),
            )
        }
    }
}
