//! Provider client abstraction
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility, so the
//! gateway can hold `Arc<dyn TokenClient>` and tests can swap in fakes.

use std::future::Future;
use std::pin::Pin;

use common::{Provider, Secret};
use reqwest::Url;
use tracing::debug;

use crate::error::{Error, Result};
use crate::failure::ProviderFailure;
use crate::grant::TokenGrant;

/// Boxed future returned by the provider traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Registered OAuth application credentials for one provider.
#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
}

/// Token endpoint operations for a single provider.
pub trait TokenClient: Send + Sync {
    /// Which provider this client talks to.
    fn provider(&self) -> Provider;

    /// URL the browser is redirected to in order to start the OAuth dance.
    fn authorization_url(&self) -> String;

    /// Exchange an authorization code for tokens. Calls the token endpoint
    /// exactly once; any non-success response is a hard failure.
    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenGrant>>;

    /// Exchange a refresh token for a fresh token set.
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, Result<TokenGrant>>;
}

/// Resolves the CRM account identifier a token belongs to.
pub trait AccountLookup: Send + Sync {
    /// Returns the portal id of the account `access_token` was issued for.
    fn fetch_portal_id<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Parse a configured endpoint, naming the provider on failure.
pub(crate) fn parse_endpoint(provider: Provider, url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::Endpoint {
        provider,
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// POST a form to a token endpoint and return the parsed JSON body.
///
/// Non-success statuses are read in full and classified so the raw provider
/// error survives for logging.
pub(crate) async fn post_form(
    http: &reqwest::Client,
    provider: Provider,
    url: &Url,
    form: &[(&str, &str)],
) -> Result<serde_json::Value> {
    let response = http
        .post(url.clone())
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Http {
            provider,
            message: e.to_string(),
        })?;

    read_json(provider, response).await
}

/// Read a response body as JSON, classifying non-success statuses.
pub(crate) async fn read_json(
    provider: Provider,
    response: reqwest::Response,
) -> Result<serde_json::Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<no body>"));

    if !status.is_success() {
        let failure = ProviderFailure::classify(status.as_u16(), body);
        debug!(%provider, status = failure.status, partial = failure.is_partial(), "provider returned failure");
        return Err(Error::Rejected { provider, failure });
    }

    serde_json::from_str(&body).map_err(|e| Error::InvalidResponse {
        provider,
        message: format!("body is not JSON: {e}"),
    })
}
