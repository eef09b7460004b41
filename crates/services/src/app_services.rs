use std::path::PathBuf;
use std::sync::Arc;

use patrol_core::model::{Ledger, SessionIdScheme};
use storage::{Storage, StorageCodec};

use crate::Clock;
use crate::error::AppServicesError;
use crate::ledger::{FileLedgerSource, HttpLedgerSource, LedgerService, LedgerSource};
use crate::patrol::PatrolSessionService;
use crate::progress::SessionProgressStore;
use crate::sync::{NetworkStatus, SyncDispatcher};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerSourceConfig {
    Http(String),
    File(PathBuf),
}

impl LedgerSourceConfig {
    fn build(&self) -> Arc<dyn LedgerSource> {
        match self {
            LedgerSourceConfig::Http(url) => Arc::new(HttpLedgerSource::new(url.clone())),
            LedgerSourceConfig::File(path) => Arc::new(FileLedgerSource::new(path.clone())),
        }
    }
}

/// Knobs resolved by the binary from flags and environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub clock: Clock,
    pub ledger_source: LedgerSourceConfig,
    pub id_scheme: SessionIdScheme,
    pub online: bool,
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    ledger: Arc<Ledger>,
    progress: Arc<SessionProgressStore>,
    patrol: Arc<PatrolSessionService>,
    sync: Arc<SyncDispatcher>,
    network: NetworkStatus,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, config: &AppConfig) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, config).await)
    }

    /// Load the ledger and progress records from `storage` and wire the services.
    pub async fn from_storage(storage: &Storage, config: &AppConfig) -> Self {
        let codec = StorageCodec::new(Arc::clone(&storage.kv));

        let ledger = LedgerService::new(codec.clone(), config.ledger_source.build())
            .load()
            .await;
        let ledger = Arc::new(ledger);

        let progress = Arc::new(SessionProgressStore::load(config.clock, codec.clone()).await);
        let network = NetworkStatus::new(config.online);
        let sync = Arc::new(SyncDispatcher::new(
            config.clock,
            Arc::clone(&progress),
            Arc::new(network.clone()),
        ));
        let patrol = Arc::new(PatrolSessionService::new(
            codec,
            Arc::clone(&progress),
            Arc::clone(&ledger),
            config.id_scheme,
        ));

        Self {
            ledger,
            progress,
            patrol,
            sync,
            network,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<SessionProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn patrol(&self) -> Arc<PatrolSessionService> {
        Arc::clone(&self.patrol)
    }

    #[must_use]
    pub fn sync(&self) -> Arc<SyncDispatcher> {
        Arc::clone(&self.sync)
    }

    #[must_use]
    pub fn network(&self) -> NetworkStatus {
        self.network.clone()
    }
}
