//! Fixed keys of the persistent key-value store.

/// Last successfully fetched ledger.
pub const LEDGER: &str = "patrolmate-ledger";

/// Active session, restored on launch.
pub const SESSION: &str = "patrolmate-session";

/// Map of session id to progress record.
pub const RESULTS: &str = "patrolmate-results";
