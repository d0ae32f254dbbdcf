//! Pieces shared by the per-provider connection flows

use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::Response;
use common::Provider;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::reply;
use crate::session_cookie::CallerSession;
use crate::state::AppState;

/// Query string of an OAuth callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    /// Set by the provider when the user denied access.
    #[serde(default)]
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parameters from an extracted query string. A query that does not
    /// deserialize (a repeated `code`, say) carries no usable code.
    pub fn from_query(
        query: std::result::Result<Query<Self>, QueryRejection>,
        provider: Provider,
    ) -> Self {
        match query {
            Ok(Query(params)) => params,
            Err(rejection) => {
                warn!(provider = %provider, error = %rejection, "unreadable callback query");
                Self::default()
            }
        }
    }

    /// The authorization code, if one was sent and is non-empty.
    pub fn code(&self, provider: Provider) -> Option<&str> {
        if let Some(error) = &self.error {
            warn!(provider = %provider, error = %error, "provider returned an authorization error");
        }
        self.code.as_deref().filter(|code| !code.is_empty())
    }
}

/// `{connected}` for `provider`, keyed by the session's CRM account.
///
/// No CRM account in the session answers `false` without touching the store.
pub async fn connection_status(
    state: &AppState,
    session: &CallerSession,
    provider: Provider,
) -> Response {
    let Some(portal_id) = session.hubspot_portal_id() else {
        return reply::json(StatusCode::OK, json!({ "connected": false }));
    };

    match state.store.get_token(portal_id, provider).await {
        Ok(record) => reply::json(StatusCode::OK, json!({ "connected": record.is_some() })),
        Err(e) => {
            warn!(provider = %provider, account_id = portal_id, error = %e, "status check failed");
            reply::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "connected": false, "error": "STATUS_CHECK_FAILED" }),
            )
        }
    }
}
