//! Shared application state
//!
//! Every collaborator is built once at startup and injected here. Handlers
//! reach the store, provider clients and session codec only through this.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::TimeDelta;
use credential_store::{CredentialStore, FileStore, MemoryStore};
use metrics_exporter_prometheus::PrometheusHandle;
use provider_auth::{
    AccountLookup, HubspotClient, HubspotEndpoints, OAuthApp, SlackClient, SlackEndpoints,
};
use session::SessionCodec;
use token_lifecycle::TokenLifecycleManager;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::session_cookie::CookieSettings;

#[derive(Clone)]
pub struct AppState {
    pub hubspot: Arc<TokenLifecycleManager>,
    pub slack: Arc<TokenLifecycleManager>,
    pub accounts: Arc<dyn AccountLookup>,
    pub store: Arc<dyn CredentialStore>,
    pub sessions: Arc<SessionCodec>,
    pub cookie: Arc<CookieSettings>,
    pub started_at: Instant,
    pub prometheus: PrometheusHandle,
}

impl AppState {
    /// Build every collaborator from configuration.
    pub async fn from_config(config: &Config, prometheus: PrometheusHandle) -> anyhow::Result<Self> {
        let store: Arc<dyn CredentialStore> = match config.store.backend {
            StoreBackend::File => {
                let store = FileStore::load(config.store.path.clone())
                    .await
                    .with_context(|| {
                        format!(
                            "failed to open credential store {}",
                            config.store.path.display()
                        )
                    })?;
                info!(path = %config.store.path.display(), "file credential store ready");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                info!("in-memory credential store ready, tokens will not survive restart");
                Arc::new(MemoryStore::new())
            }
        };

        let http = reqwest::Client::new();

        let mut hubspot_endpoints = HubspotEndpoints::default();
        if let Some(url) = &config.hubspot.authorize_url {
            hubspot_endpoints.authorize = url.clone();
        }
        if let Some(url) = &config.hubspot.token_url {
            hubspot_endpoints.token = url.clone();
        }
        if let Some(url) = &config.hubspot.api_base {
            hubspot_endpoints.api_base = url.clone();
        }
        let hubspot = Arc::new(
            HubspotClient::new(
                http.clone(),
                OAuthApp {
                    client_id: config.hubspot.client_id.clone(),
                    client_secret: config.hubspot.client_secret.clone(),
                    redirect_uri: config.hubspot.redirect_uri.clone(),
                },
                hubspot_endpoints,
            )
            .context("invalid hubspot endpoint")?,
        );

        let mut slack_endpoints = SlackEndpoints::default();
        if let Some(url) = &config.slack.authorize_url {
            slack_endpoints.authorize = url.clone();
        }
        if let Some(url) = &config.slack.token_url {
            slack_endpoints.token = url.clone();
        }
        let slack = Arc::new(
            SlackClient::new(
                http,
                OAuthApp {
                    client_id: config.slack.client_id.clone(),
                    client_secret: config.slack.client_secret.clone(),
                    redirect_uri: config.slack.redirect_uri.clone(),
                },
                slack_endpoints,
            )
            .context("invalid slack endpoint")?,
        );

        let threshold = TimeDelta::try_seconds(config.tokens.refresh_threshold_secs)
            .context("refresh threshold out of range")?;
        let validity =
            TimeDelta::try_days(config.session.ttl_days).context("session ttl out of range")?;

        Ok(Self {
            hubspot: Arc::new(
                TokenLifecycleManager::new(hubspot.clone(), store.clone()).with_threshold(threshold),
            ),
            slack: Arc::new(
                TokenLifecycleManager::new(slack, store.clone()).with_threshold(threshold),
            ),
            accounts: hubspot,
            store,
            sessions: Arc::new(SessionCodec::new(&config.session.secret, validity)),
            cookie: Arc::new(CookieSettings::new(
                config.session.cookie_name.clone(),
                validity,
                config.server.production,
            )),
            started_at: Instant::now(),
            prometheus,
        })
    }
}
