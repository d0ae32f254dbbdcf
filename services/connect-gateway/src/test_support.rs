//! Fakes for router tests: provider clients and a call-counting store

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::TimeDelta;
use common::{Provider, Secret};
use credential_store::store::StoreFuture;
use credential_store::{CredentialStore, MemoryStore, TokenRecord};
use provider_auth::{
    AccountLookup, BoxFuture, CrmGrant, MessagingGrant, ProviderFailure, Team, TokenClient,
    TokenGrant,
};
use serde_json::Map;
use session::{SessionCodec, SessionPayload};
use token_lifecycle::TokenLifecycleManager;

use crate::session_cookie::CookieSettings;
use crate::state::AppState;

pub const SESSION_SECRET: &str = "router-test-session-secret";

fn rejected(provider: Provider, status: u16, body: &str) -> provider_auth::Error {
    provider_auth::Error::Rejected {
        provider,
        failure: ProviderFailure::classify(status, body.to_string()),
    }
}

/// CRM fake: code `abc` yields `T1`, and `T1` belongs to portal `42`.
#[derive(Default)]
pub struct FakeHubspot {
    pub exchanges: AtomicUsize,
}

impl TokenClient for FakeHubspot {
    fn provider(&self) -> Provider {
        Provider::Hubspot
    }

    fn authorization_url(&self) -> String {
        "https://app.hubspot.test/oauth/authorize?client_id=hs".into()
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, provider_auth::Result<TokenGrant>> {
        Box::pin(async move {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            if code != "abc" {
                return Err(rejected(
                    Provider::Hubspot,
                    400,
                    r#"{"status":"BAD_AUTH_CODE","message":"code expired"}"#,
                ));
            }
            Ok(TokenGrant::Crm(CrmGrant {
                access_token: "T1".into(),
                refresh_token: "R1".into(),
                expires_in: 3600,
                token_type: Some("bearer".into()),
                extra: Map::new(),
            }))
        })
    }

    fn refresh<'a>(&'a self, _refresh_token: &'a str) -> BoxFuture<'a, provider_auth::Result<TokenGrant>> {
        Box::pin(async move {
            Ok(TokenGrant::Crm(CrmGrant {
                access_token: "T2".into(),
                refresh_token: "R2".into(),
                expires_in: 3600,
                token_type: None,
                extra: Map::new(),
            }))
        })
    }
}

impl AccountLookup for FakeHubspot {
    fn fetch_portal_id<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, provider_auth::Result<String>> {
        Box::pin(async move {
            if access_token == "T1" {
                Ok("42".to_string())
            } else {
                Err(rejected(Provider::Hubspot, 401, r#"{"category":"EXPIRED_AUTHENTICATION"}"#))
            }
        })
    }
}

/// Messaging fake: code `xyz` yields a bot token for team `T9`.
#[derive(Default)]
pub struct FakeSlack {
    pub exchanges: AtomicUsize,
}

impl TokenClient for FakeSlack {
    fn provider(&self) -> Provider {
        Provider::Slack
    }

    fn authorization_url(&self) -> String {
        "https://slack.test/oauth/v2/authorize?client_id=sl".into()
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, provider_auth::Result<TokenGrant>> {
        Box::pin(async move {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            if code != "xyz" {
                return Err(rejected(Provider::Slack, 200, r#"{"ok":false,"error":"invalid_code"}"#));
            }
            Ok(TokenGrant::Messaging(MessagingGrant {
                access_token: "xoxb-1".into(),
                team: Team {
                    id: "T9".into(),
                    name: "Acme".into(),
                },
                extra: Map::new(),
            }))
        })
    }

    fn refresh<'a>(&'a self, _refresh_token: &'a str) -> BoxFuture<'a, provider_auth::Result<TokenGrant>> {
        Box::pin(async move {
            Err(provider_auth::Error::Unsupported {
                provider: Provider::Slack,
                operation: "token refresh",
            })
        })
    }
}

/// Memory store that counts every call and can be switched to fail.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub calls: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail: bool,
}

impl CountingStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read straight from the backing store without counting.
    pub async fn peek(&self, account_id: &str, provider: Provider) -> Option<TokenRecord> {
        self.inner.get_token(account_id, provider).await.unwrap()
    }

    fn enter(&self, write: bool) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if write {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        self.fail
    }
}

fn unavailable<'a, T: Send + 'a>() -> StoreFuture<'a, T> {
    Box::pin(async { Err(credential_store::Error::Io("store unavailable".into())) })
}

impl CredentialStore for CountingStore {
    fn get_token<'a>(&'a self, account_id: &'a str, provider: Provider) -> StoreFuture<'a, Option<TokenRecord>> {
        if self.enter(false) {
            return unavailable();
        }
        self.inner.get_token(account_id, provider)
    }

    fn put_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
        record: TokenRecord,
    ) -> StoreFuture<'a, ()> {
        if self.enter(true) {
            return unavailable();
        }
        self.inner.put_token(account_id, provider, record)
    }

    fn delete_token<'a>(&'a self, account_id: &'a str, provider: Provider) -> StoreFuture<'a, bool> {
        if self.enter(true) {
            return unavailable();
        }
        self.inner.delete_token(account_id, provider)
    }

    fn get_rules<'a>(&'a self, account_id: &'a str) -> StoreFuture<'a, Vec<String>> {
        if self.enter(false) {
            return unavailable();
        }
        self.inner.get_rules(account_id)
    }

    fn put_rules<'a>(&'a self, account_id: &'a str, rules: Vec<String>) -> StoreFuture<'a, ()> {
        if self.enter(true) {
            return unavailable();
        }
        self.inner.put_rules(account_id, rules)
    }
}

pub struct Harness {
    pub state: AppState,
    pub hubspot: Arc<FakeHubspot>,
    pub slack: Arc<FakeSlack>,
    pub store: Arc<CountingStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(CountingStore::default(), false)
    }

    pub fn with_store(store: CountingStore, production: bool) -> Self {
        let hubspot = Arc::new(FakeHubspot::default());
        let slack = Arc::new(FakeSlack::default());
        let store = Arc::new(store);
        let validity = TimeDelta::days(session::DEFAULT_VALIDITY_DAYS);

        let state = AppState {
            hubspot: Arc::new(TokenLifecycleManager::new(hubspot.clone(), store.clone())),
            slack: Arc::new(TokenLifecycleManager::new(slack.clone(), store.clone())),
            accounts: hubspot.clone(),
            store: store.clone(),
            sessions: Arc::new(SessionCodec::new(&Secret::from(SESSION_SECRET), validity)),
            cookie: Arc::new(CookieSettings::new("session_token", validity, production)),
            started_at: Instant::now(),
            prometheus: metrics_exporter_prometheus::PrometheusBuilder::new()
                .build_recorder()
                .handle(),
        };

        Self {
            state,
            hubspot,
            slack,
            store,
        }
    }

    /// `Cookie` header value carrying a session signed for this harness.
    pub fn cookie_for(&self, payload: &SessionPayload) -> String {
        format!("session_token={}", self.state.sessions.issue(payload).unwrap())
    }

    /// Decode the session set by a response's `Set-Cookie` value.
    pub fn decode_set_cookie(&self, set_cookie: &str) -> SessionPayload {
        let token = set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("session_token="))
            .expect("session cookie");
        self.state.sessions.decode(token).unwrap()
    }
}
