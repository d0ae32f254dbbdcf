//! Token lifecycle: code exchange, staleness, just-in-time refresh
//!
//! One `TokenLifecycleManager` per provider. It owns the decision of whether
//! a stored token is stale and drives refresh-then-persist:
//!
//! 1. Read the record for the account; absent means `NotConnected`
//! 2. Stale when `now >= created_at + expires_in - threshold`
//! 3. Stale: refresh through the provider, write the whole new record,
//!    return the new access token
//! 4. Refresh failure leaves the stored record untouched
//!
//! There is no locking. Two concurrent refreshes for one account both write
//! and the later write wins; each holds a valid token so nothing breaks.

pub mod clock;
pub mod error;
pub mod manager;

pub use clock::{Clock, SystemClock};
pub use error::{Error, RefreshFailure, Result};
pub use manager::{DEFAULT_REFRESH_THRESHOLD_SECS, TokenLifecycleManager, is_stale, record_from_grant};
