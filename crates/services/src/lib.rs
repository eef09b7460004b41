#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod ledger;
pub mod patrol;
pub mod progress;
pub mod sync;

pub use patrol_core::Clock;

pub use app_services::{AppConfig, AppServices, LedgerSourceConfig};
pub use error::{AppServicesError, LedgerFetchError};
pub use ledger::{FileLedgerSource, HttpLedgerSource, LedgerService, LedgerSource};
pub use patrol::{ActiveSession, PatrolSessionService, SessionSnapshot};
pub use progress::SessionProgressStore;
pub use sync::{Connectivity, NetworkStatus, SyncDispatcher, SyncReport, SyncStatus};
