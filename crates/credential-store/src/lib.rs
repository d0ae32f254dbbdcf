//! Durable storage for provider token records and notification rules
//!
//! Records are keyed by `(account_id, provider)` where the account id is the
//! CRM portal id. A record is always written whole; there is no partial
//! update. Staleness is derived from `created_at + expires_in` by the caller,
//! the store keeps no validity flag of its own.
//!
//! Two backends implement `CredentialStore`:
//! - `MemoryStore` for tests and throwaway deployments
//! - `FileStore`, a single JSON document written atomically on every change

pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{CreatedAt, NotificationRules, TeamRef, TokenRecord};
pub use store::CredentialStore;
