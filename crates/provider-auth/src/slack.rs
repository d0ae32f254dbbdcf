//! Messaging (Slack) OAuth client
//!
//! The messaging provider reports logical failures as HTTP 200 with
//! `"ok": false`, so a successful status alone does not mean the exchange
//! worked. Its bot tokens do not expire and no refresh path exists.

use common::Provider;
use reqwest::Url;
use serde_json::Value;

use crate::client::{BoxFuture, OAuthApp, TokenClient, parse_endpoint, post_form};
use crate::constants::{SLACK_AUTHORIZE_ENDPOINT, SLACK_SCOPES, SLACK_TOKEN_ENDPOINT};
use crate::error::{Error, Result};
use crate::failure::ProviderFailure;
use crate::grant::{MessagingGrant, TokenGrant};

/// Endpoint set for the messaging provider.
#[derive(Debug, Clone)]
pub struct SlackEndpoints {
    pub authorize: String,
    pub token: String,
}

impl Default for SlackEndpoints {
    fn default() -> Self {
        Self {
            authorize: SLACK_AUTHORIZE_ENDPOINT.into(),
            token: SLACK_TOKEN_ENDPOINT.into(),
        }
    }
}

pub struct SlackClient {
    http: reqwest::Client,
    app: OAuthApp,
    authorize_url: Url,
    token_url: Url,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, app: OAuthApp, endpoints: SlackEndpoints) -> Result<Self> {
        Ok(Self {
            http,
            app,
            authorize_url: parse_endpoint(Provider::Slack, &endpoints.authorize)?,
            token_url: parse_endpoint(Provider::Slack, &endpoints.token)?,
        })
    }
}

impl TokenClient for SlackClient {
    fn provider(&self) -> Provider {
        Provider::Slack
    }

    fn authorization_url(&self) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.app.client_id)
            .append_pair("scope", &SLACK_SCOPES.join(","))
            .append_pair("redirect_uri", &self.app.redirect_uri);
        url.into()
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenGrant>> {
        Box::pin(async move {
            let body = post_form(
                &self.http,
                Provider::Slack,
                &self.token_url,
                &[
                    ("client_id", self.app.client_id.as_str()),
                    ("client_secret", self.app.client_secret.expose().as_str()),
                    ("redirect_uri", self.app.redirect_uri.as_str()),
                    ("code", code),
                ],
            )
            .await?;

            parse_access_response(body).map(TokenGrant::Messaging)
        })
    }

    fn refresh<'a>(&'a self, _refresh_token: &'a str) -> BoxFuture<'a, Result<TokenGrant>> {
        Box::pin(async move {
            Err(Error::Unsupported {
                provider: Provider::Slack,
                operation: "token refresh",
            })
        })
    }
}

/// Validate an `oauth.v2.access` body. `ok: false` is a hard failure even
/// though the HTTP status was 200.
fn parse_access_response(body: Value) -> Result<MessagingGrant> {
    let Value::Object(mut map) = body else {
        return Err(Error::InvalidResponse {
            provider: Provider::Slack,
            message: "body is not a JSON object".into(),
        });
    };

    if map.get("ok").and_then(Value::as_bool) != Some(true) {
        let raw = Value::Object(map).to_string();
        return Err(Error::Rejected {
            provider: Provider::Slack,
            failure: ProviderFailure::classify(200, raw),
        });
    }
    map.remove("ok");

    serde_json::from_value(Value::Object(map)).map_err(|e| Error::InvalidResponse {
        provider: Provider::Slack,
        message: e.to_string(),
    })
}
