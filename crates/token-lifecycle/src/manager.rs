//! Token lifecycle manager

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use common::Provider;
use credential_store::{CreatedAt, CredentialStore, TeamRef, TokenRecord};
use provider_auth::{TokenClient, TokenGrant};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, RefreshFailure, Result};

/// Refresh this many seconds before the provider's stated expiry.
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 60;

/// Whether `record` must be refreshed at `now`.
///
/// Stale when `now >= created_at + expires_in - threshold`. A record without
/// `expires_in` never goes stale. A threshold reaching past the start of
/// the representable range counts as stale.
pub fn is_stale(
    record: &TokenRecord,
    now: DateTime<Utc>,
    threshold: TimeDelta,
) -> credential_store::Result<bool> {
    Ok(match record.expires_at()? {
        Some(expires_at) => expires_at
            .checked_sub_signed(threshold)
            .is_none_or(|refresh_at| now >= refresh_at),
        None => false,
    })
}

/// Turn a validated grant into a whole token record created at `now`.
pub fn record_from_grant(grant: TokenGrant, now: DateTime<Utc>) -> TokenRecord {
    let created_at = CreatedAt::from_instant(now);
    match grant {
        TokenGrant::Crm(grant) => TokenRecord {
            access_token: grant.access_token,
            refresh_token: Some(grant.refresh_token),
            expires_in: Some(grant.expires_in),
            created_at,
            team: None,
        },
        TokenGrant::Messaging(grant) => TokenRecord {
            access_token: grant.access_token,
            refresh_token: None,
            expires_in: None,
            created_at,
            team: Some(TeamRef {
                id: grant.team.id,
                name: grant.team.name,
            }),
        },
    }
}

/// Exchanges codes for one provider and keeps that provider's stored
/// tokens usable.
pub struct TokenLifecycleManager {
    client: Arc<dyn TokenClient>,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    threshold: TimeDelta,
}

impl TokenLifecycleManager {
    pub fn new(client: Arc<dyn TokenClient>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            store,
            clock: Arc::new(SystemClock),
            threshold: TimeDelta::seconds(DEFAULT_REFRESH_THRESHOLD_SECS),
        }
    }

    pub fn with_threshold(mut self, threshold: TimeDelta) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider(&self) -> Provider {
        self.client.provider()
    }

    pub fn threshold(&self) -> TimeDelta {
        self.threshold
    }

    /// Where to send the browser to start this provider's OAuth flow.
    pub fn authorization_url(&self) -> String {
        self.client.authorization_url()
    }

    /// Exchange an authorization code for a token record.
    ///
    /// Calls the provider exactly once. The record is not persisted: the
    /// caller decides which account it belongs to.
    pub async fn exchange_for_tokens(&self, code: &str) -> Result<TokenRecord> {
        let provider = self.provider();
        match self.client.exchange_code(code).await {
            Ok(grant) => {
                debug!(provider = %provider, "authorization code exchanged");
                Ok(record_from_grant(grant, self.clock.now()))
            }
            Err(e) => {
                match e.failure() {
                    Some(failure) => warn!(
                        provider = %provider,
                        status = failure.status,
                        partial = failure.is_partial(),
                        body = %failure.raw_body,
                        "token exchange rejected"
                    ),
                    None => warn!(provider = %provider, error = %e, "token exchange failed"),
                }
                Err(Error::Exchange(e))
            }
        }
    }

    /// Persist a whole record for `account_id`, replacing any previous one.
    pub async fn save(&self, account_id: &str, record: TokenRecord) -> Result<()> {
        self.store
            .put_token(account_id, self.provider(), record)
            .await?;
        Ok(())
    }

    /// Access token for `account_id`, refreshed first when stale.
    pub async fn get_valid_access_token(&self, account_id: &str) -> Result<String> {
        let provider = self.provider();
        let Some(record) = self.store.get_token(account_id, provider).await? else {
            return Err(Error::NotConnected {
                provider,
                account_id: account_id.to_string(),
            });
        };

        let stale = match is_stale(&record, self.clock.now(), self.threshold) {
            Ok(stale) => stale,
            Err(e) => {
                // Unknown age: a refresh is the only way to a known one
                warn!(provider = %provider, account_id = account_id, error = %e, "unreadable token timestamp");
                true
            }
        };
        if !stale {
            return Ok(record.access_token);
        }

        debug!(provider = %provider, account_id = account_id, "token stale, refreshing");
        self.refresh(account_id, &record).await
    }

    /// Refresh and persist. On any failure before the write, the stored
    /// record is left exactly as it was.
    async fn refresh(&self, account_id: &str, record: &TokenRecord) -> Result<String> {
        let provider = self.provider();
        let Some(refresh_token) = record.refresh_token.as_deref() else {
            record_refresh(provider, "failure");
            warn!(provider = %provider, account_id = account_id, "stale token has no refresh token");
            return Err(Error::RefreshFailed {
                provider,
                reason: RefreshFailure::NoRefreshToken,
            });
        };

        let grant = match self.client.refresh(refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                record_refresh(provider, "failure");
                warn!(provider = %provider, account_id = account_id, error = %e, "token refresh failed");
                return Err(Error::RefreshFailed {
                    provider,
                    reason: RefreshFailure::Provider(e),
                });
            }
        };

        let fresh = record_from_grant(grant, self.clock.now());
        let access_token = fresh.access_token.clone();
        self.store.put_token(account_id, provider, fresh).await?;

        record_refresh(provider, "success");
        info!(provider = %provider, account_id = account_id, "token refreshed");
        Ok(access_token)
    }
}

fn record_refresh(provider: Provider, outcome: &'static str) {
    metrics::counter!("token_refresh_total", "provider" => provider.as_str(), "outcome" => outcome)
        .increment(1);
}
