//! CRM (HubSpot) OAuth client
//!
//! Both token operations POST a form to the token endpoint with different
//! grant types. The portal id is not part of the token response; it comes
//! from the account details call made with the fresh access token.

use common::Provider;
use reqwest::Url;
use serde::Deserialize;

use crate::client::{
    AccountLookup, BoxFuture, OAuthApp, TokenClient, parse_endpoint, post_form, read_json,
};
use crate::constants::{
    HUBSPOT_ACCOUNT_INFO_PATH, HUBSPOT_API_BASE, HUBSPOT_AUTHORIZE_ENDPOINT, HUBSPOT_SCOPES,
    HUBSPOT_TOKEN_ENDPOINT,
};
use crate::error::{Error, Result};
use crate::grant::{CrmGrant, TokenGrant};

/// Endpoint set for the CRM provider.
#[derive(Debug, Clone)]
pub struct HubspotEndpoints {
    pub authorize: String,
    pub token: String,
    pub api_base: String,
}

impl Default for HubspotEndpoints {
    fn default() -> Self {
        Self {
            authorize: HUBSPOT_AUTHORIZE_ENDPOINT.into(),
            token: HUBSPOT_TOKEN_ENDPOINT.into(),
            api_base: HUBSPOT_API_BASE.into(),
        }
    }
}

/// Account details returned by the CRM. Only `portalId` is required.
#[derive(Debug, Deserialize)]
struct AccountInfo {
    #[serde(rename = "portalId")]
    portal_id: u64,
}

pub struct HubspotClient {
    http: reqwest::Client,
    app: OAuthApp,
    authorize_url: Url,
    token_url: Url,
    account_info_url: Url,
}

impl HubspotClient {
    pub fn new(http: reqwest::Client, app: OAuthApp, endpoints: HubspotEndpoints) -> Result<Self> {
        let provider = Provider::Hubspot;
        let account_info = format!(
            "{}{}",
            endpoints.api_base.trim_end_matches('/'),
            HUBSPOT_ACCOUNT_INFO_PATH
        );
        Ok(Self {
            http,
            app,
            authorize_url: parse_endpoint(provider, &endpoints.authorize)?,
            token_url: parse_endpoint(provider, &endpoints.token)?,
            account_info_url: parse_endpoint(provider, &account_info)?,
        })
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let body = post_form(&self.http, Provider::Hubspot, &self.token_url, form).await?;
        let grant: CrmGrant = serde_json::from_value(body).map_err(|e| Error::InvalidResponse {
            provider: Provider::Hubspot,
            message: e.to_string(),
        })?;
        Ok(TokenGrant::Crm(grant))
    }
}

impl TokenClient for HubspotClient {
    fn provider(&self) -> Provider {
        Provider::Hubspot
    }

    fn authorization_url(&self) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", self.app.client_id.as_str())
            .append_pair("redirect_uri", self.app.redirect_uri.as_str())
            .append_pair("scope", &HUBSPOT_SCOPES.join(" "))
            .append_pair("response_type", "code");
        url.into()
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenGrant>> {
        Box::pin(async move {
            self.token_request(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.app.client_id.as_str()),
                ("client_secret", self.app.client_secret.expose().as_str()),
                ("redirect_uri", self.app.redirect_uri.as_str()),
                ("code", code),
            ])
            .await
        })
    }

    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, Result<TokenGrant>> {
        Box::pin(async move {
            self.token_request(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.app.client_id.as_str()),
                ("client_secret", self.app.client_secret.expose().as_str()),
                ("redirect_uri", self.app.redirect_uri.as_str()),
                ("refresh_token", refresh_token),
            ])
            .await
        })
    }
}

impl AccountLookup for HubspotClient {
    fn fetch_portal_id<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let provider = Provider::Hubspot;
            let response = self
                .http
                .get(self.account_info_url.clone())
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| Error::Http {
                    provider,
                    message: e.to_string(),
                })?;

            let body = read_json(provider, response).await?;
            let info: AccountInfo =
                serde_json::from_value(body).map_err(|e| Error::InvalidResponse {
                    provider,
                    message: format!("account details: {e}"),
                })?;
            Ok(info.portal_id.to_string())
        })
    }
}
