//! JSON file credential store
//!
//! The whole store lives in one JSON document. All writes use atomic
//! temp-file + rename to prevent corruption on crash, and a tokio Mutex
//! serializes concurrent writers from parallel requests. Reads take the lock
//! briefly to clone what they need.

use std::path::{Path, PathBuf};

use common::Provider;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::TokenRecord;
use crate::store::{CredentialStore, Document, StoreFuture};

pub struct FileStore {
    path: PathBuf,
    state: Mutex<Document>,
}

impl FileStore {
    /// Load the store from `path`.
    ///
    /// If the file doesn't exist it is created as an empty document, so a
    /// cold start with zero connected accounts works without setup.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| Error::Io(format!("checking credential file: {e}")))?
        {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let document: Document = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), accounts = document.accounts.len(), "loaded credential store");
            document
        } else {
            info!(path = %path.display(), "credential file not found, starting with empty store");
            let document = Document::default();
            write_atomic(&path, &document).await?;
            document
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileStore {
    fn get_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
    ) -> StoreFuture<'a, Option<TokenRecord>> {
        Box::pin(async move { Ok(self.state.lock().await.token(account_id, provider)) })
    }

    fn put_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
        record: TokenRecord,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let mut next = state.clone();
            next.set_token(account_id, provider, record);
            write_atomic(&self.path, &next).await?;
            *state = next;
            debug!(account_id, %provider, "stored token record");
            Ok(())
        })
    }

    fn delete_token<'a>(
        &'a self,
        account_id: &'a str,
        provider: Provider,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let mut next = state.clone();
            if !next.remove_token(account_id, provider) {
                return Ok(false);
            }
            write_atomic(&self.path, &next).await?;
            *state = next;
            debug!(account_id, %provider, "deleted token record");
            Ok(true)
        })
    }

    fn get_rules<'a>(&'a self, account_id: &'a str) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move { Ok(self.state.lock().await.rules(account_id)) })
    }

    fn put_rules<'a>(&'a self, account_id: &'a str, rules: Vec<String>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let mut next = state.clone();
            let count = rules.len();
            next.set_rules(account_id, rules);
            write_atomic(&self.path, &next).await?;
            *state = next;
            debug!(account_id, count, "stored notification rules");
            Ok(())
        })
    }
}

/// Write the document to `path` atomically.
///
/// Writes a temporary file in the same directory, then renames it over the
/// target. Permissions are 0600 on unix since the file holds OAuth tokens.
/// The in-memory state is only replaced after this succeeds, so a failed
/// write leaves both copies at the previous version.
async fn write_atomic(path: &Path, document: &Document) -> Result<()> {
    let json = serde_json::to_string_pretty(document)
        .map_err(|e| Error::Parse(format!("serializing credential store: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credential store");
    Ok(())
}
