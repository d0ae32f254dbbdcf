//! Credential store trait and the shared document model

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use common::Provider;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::{NotificationRules, TokenRecord};

/// Boxed future returned by `CredentialStore` methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Durable key-value persistence for token records and notification rules.
///
/// No logic beyond get/set/delete: callers decide staleness and what to
/// write. Uses boxed futures so the store can be shared as
/// `Arc<dyn CredentialStore>`.
pub trait CredentialStore: Send + Sync {
    /// Latest token record for `(account_id, provider)`, if any.
    fn get_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
    ) -> StoreFuture<'a, Option<TokenRecord>>;

    /// Replace the token record for `(account_id, provider)`.
    fn put_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
        record: TokenRecord,
    ) -> StoreFuture<'a, ()>;

    /// Delete the token record. Returns whether one existed.
    fn delete_token<'a>(&'a self, account_id: &'a str, provider: Provider)
    -> StoreFuture<'a, bool>;

    /// Notification rules for an account, empty when none were saved.
    fn get_rules<'a>(&'a self, account_id: &'a str) -> StoreFuture<'a, Vec<String>>;

    /// Replace the notification rules for an account.
    fn put_rules<'a>(&'a self, account_id: &'a str, rules: Vec<String>) -> StoreFuture<'a, ()>;
}

/// Everything stored for one CRM account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct AccountEntry {
    #[serde(default)]
    pub tokens: BTreeMap<Provider, TokenRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_rules: Option<NotificationRules>,
}

impl AccountEntry {
    fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.notification_rules.is_none()
    }
}

/// The whole persisted state, keyed by account id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Document {
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountEntry>,
}

impl Document {
    pub fn token(&self, account_id: &str, provider: Provider) -> Option<TokenRecord> {
        self.accounts
            .get(account_id)
            .and_then(|entry| entry.tokens.get(&provider))
            .cloned()
    }

    pub fn set_token(&mut self, account_id: &str, provider: Provider, record: TokenRecord) {
        self.accounts
            .entry(account_id.to_string())
            .or_default()
            .tokens
            .insert(provider, record);
    }

    pub fn remove_token(&mut self, account_id: &str, provider: Provider) -> bool {
        let Some(entry) = self.accounts.get_mut(account_id) else {
            return false;
        };
        let removed = entry.tokens.remove(&provider).is_some();
        if entry.is_empty() {
            self.accounts.remove(account_id);
        }
        removed
    }

    pub fn rules(&self, account_id: &str) -> Vec<String> {
        self.accounts
            .get(account_id)
            .and_then(|entry| entry.notification_rules.as_ref())
            .map(|saved| saved.rules.clone())
            .unwrap_or_default()
    }

    pub fn set_rules(&mut self, account_id: &str, rules: Vec<String>) {
        self.accounts
            .entry(account_id.to_string())
            .or_default()
            .notification_rules = Some(NotificationRules {
            rules,
            updated_at: Utc::now(),
        });
    }
}
