use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use patrol_core::Clock;
use tracing::info;

use crate::progress::{Change, SessionProgressStore};

pub const NOTHING_TO_SYNC_MESSAGE: &str = "同期対象の巡回結果はありません。";
pub const OFFLINE_MESSAGE: &str = "現在オフラインのため同期できません。";

/// Reachability signal supplied by the environment.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Shared online/offline flag. Clones observe the same state.
#[derive(Clone, Debug)]
pub struct NetworkStatus {
    online: Arc<AtomicBool>,
}

impl NetworkStatus {
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for NetworkStatus {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    NothingToSync,
    Offline,
    Synced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub count: usize,
    pub synced_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    fn skipped(status: SyncStatus) -> Self {
        Self {
            status,
            count: 0,
            synced_at: None,
        }
    }

    /// Operator-facing status line.
    #[must_use]
    pub fn message(&self) -> String {
        match self.status {
            SyncStatus::NothingToSync => NOTHING_TO_SYNC_MESSAGE.to_owned(),
            SyncStatus::Offline => OFFLINE_MESSAGE.to_owned(),
            SyncStatus::Synced => format!("端末内の{}件を同期済みとして記録しました。", self.count),
        }
    }
}

/// Marks pending sessions as synced.
///
/// This only flips local flags; nothing is sent over the network.
#[derive(Clone)]
pub struct SyncDispatcher {
    clock: Clock,
    store: Arc<SessionProgressStore>,
    connectivity: Arc<dyn Connectivity>,
}

impl SyncDispatcher {
    #[must_use]
    pub fn new(
        clock: Clock,
        store: Arc<SessionProgressStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            clock,
            store,
            connectivity,
        }
    }

    /// Sync every unsynced session that has at least one recorded item.
    ///
    /// All sessions in one batch share a single `synced_at`.
    pub async fn sync(&self) -> SyncReport {
        let online = self.connectivity.is_online();
        let at = self.clock.now();

        let report = self
            .store
            .modify(|results| {
                let pending: Vec<_> = results
                    .iter()
                    .filter(|(_, record)| record.is_pending())
                    .map(|(id, _)| id.clone())
                    .collect();

                if pending.is_empty() {
                    return Change::Unchanged(SyncReport::skipped(SyncStatus::NothingToSync));
                }
                if !online {
                    return Change::Unchanged(SyncReport::skipped(SyncStatus::Offline));
                }

                for id in &pending {
                    if let Some(record) = results.get_mut(id) {
                        record.mark_synced(at);
                    }
                }
                Change::Persist(SyncReport {
                    status: SyncStatus::Synced,
                    count: pending.len(),
                    synced_at: Some(at),
                })
            })
            .await;

        info!(status = ?report.status, count = report.count, "sync finished");
        report
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }
}
