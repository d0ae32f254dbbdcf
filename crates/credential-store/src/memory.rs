//! In-memory credential store

use common::Provider;
use tokio::sync::RwLock;

use crate::record::TokenRecord;
use crate::store::{CredentialStore, Document, StoreFuture};

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
    ) -> StoreFuture<'a, Option<TokenRecord>> {
        Box::pin(async move { Ok(self.state.read().await.token(account_id, provider)) })
    }

    fn put_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
        record: TokenRecord,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.state
                .write()
                .await
                .set_token(account_id, provider, record);
            Ok(())
        })
    }

    fn delete_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            Ok(self
                .state
                .write()
                .await
                .remove_token(account_id, provider))
        })
    }

    fn get_rules<'a>(&'a self, account_id: &'a str) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move { Ok(self.state.read().await.rules(account_id)) })
    }

    fn put_rules<'a>(&'a self, account_id: &'a str, rules: Vec<String>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.state.write().await.set_rules(account_id, rules);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CreatedAt;

    #[tokio::test]
    async fn put_replaces_whole_record() {
        let store = MemoryStore::new();
        let first = TokenRecord {
            access_token: "T1".into(),
            refresh_token: Some("R1".into()),
            expires_in: Some(3600),
            created_at: CreatedAt::Millis(1),
            team: None,
        };
        store
            .put_token("42", Provider::Hubspot, first)
            .await
            .unwrap();

        let second = TokenRecord {
            access_token: "T2".into(),
            refresh_token: None,
            expires_in: Some(60),
            created_at: CreatedAt::Millis(2),
            team: None,
        };
        store
            .put_token("42", Provider::Hubspot, second.clone())
            .await
            .unwrap();

        let stored = store.get_token("42", Provider::Hubspot).await.unwrap();
        assert_eq!(stored, Some(second));
    }

    #[tokio::test]
    async fn rules_default_to_empty_and_keep_order() {
        let store = MemoryStore::new();
        assert!(store.get_rules("42").await.unwrap().is_empty());

        let rules = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        store.put_rules("42", rules.clone()).await.unwrap();
        assert_eq!(store.get_rules("42").await.unwrap(), rules);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = MemoryStore::new();
        assert!(!store.delete_token("42", Provider::Slack).await.unwrap());
    }
}
