use std::collections::BTreeMap;

use patrol_core::Clock;
use patrol_core::model::{ItemPatch, ProgressRecord, SessionId, SessionMeta};
use serde::ser::{Serialize, SerializeMap, Serializer};
use storage::{StorageCodec, keys};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub(crate) type Results = BTreeMap<SessionId, ProgressRecord>;

/// Outcome of a closure passed to `SessionProgressStore::modify`.
pub(crate) enum Change<R> {
    Persist(R),
    Unchanged(R),
}

/// Readable records plus stored entries that failed to parse.
///
/// Unreadable entries are written back verbatim until their session is saved again.
#[derive(Default)]
struct Cache {
    records: Results,
    unreadable: BTreeMap<SessionId, serde_json::Value>,
}

impl Serialize for Cache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map =
            serializer.serialize_map(Some(self.records.len() + self.unreadable.len()))?;
        for (session_id, record) in &self.records {
            map.serialize_entry(session_id.as_str(), record)?;
        }
        for (session_id, raw) in &self.unreadable {
            map.serialize_entry(session_id.as_str(), raw)?;
        }
        map.end()
    }
}

/// Progress records of every session, cached in memory and written through to storage.
///
/// Each save rewrites the whole `patrolmate-results` map, so the stored map always
/// matches the cache. All mutations hold the cache lock across read, merge and persist.
pub struct SessionProgressStore {
    clock: Clock,
    codec: StorageCodec,
    cache: Mutex<Cache>,
}

impl SessionProgressStore {
    /// Load stored results. Entries that fail to parse are kept aside and logged.
    pub async fn load(clock: Clock, codec: StorageCodec) -> Self {
        let raw: Option<BTreeMap<String, serde_json::Value>> =
            codec.read_json(keys::RESULTS).await;
        let mut cache = Cache::default();
        for (session_id, value) in raw.unwrap_or_default() {
            let session_id = SessionId::from_raw(session_id);
            match serde_json::from_value::<ProgressRecord>(value.clone()) {
                Ok(record) => {
                    cache.records.insert(session_id, record);
                }
                Err(err) => {
                    warn!(%session_id, error = %err, "keeping unreadable progress record as-is");
                    cache.unreadable.insert(session_id, value);
                }
            }
        }
        debug!(
            sessions = cache.records.len(),
            unreadable = cache.unreadable.len(),
            "loaded progress records"
        );

        Self {
            clock,
            codec,
            cache: Mutex::new(cache),
        }
    }

    /// Owned copy of the record for `session_id`, or an empty unsynced record.
    pub async fn get_session_progress(&self, session_id: &SessionId) -> ProgressRecord {
        self.cache
            .lock()
            .await
            .records
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the record for `session_id` and persist the whole map.
    pub async fn save_session_progress(&self, session_id: &SessionId, record: &ProgressRecord) {
        self.modify(|results| {
            results.insert(session_id.clone(), record.clone());
            Change::Persist(())
        })
        .await;
    }

    /// Merge `patch` into one item of a session and return the updated record.
    ///
    /// Sync status is invalidated on every call, whether or not the item changed.
    pub async fn update_item_result(
        &self,
        session_id: &SessionId,
        item_id: &str,
        patch: &ItemPatch,
    ) -> ProgressRecord {
        let now = self.clock.now();
        self.modify(|results| {
            let record = results.entry(session_id.clone()).or_default();
            record.apply_item_patch(item_id, patch, now);
            Change::Persist(record.clone())
        })
        .await
    }

    /// Attach `meta` to a session, creating the record if needed, and return it.
    /// Items and sync state are left as stored.
    pub async fn set_meta(&self, session_id: &SessionId, meta: SessionMeta) -> ProgressRecord {
        self.modify(|results| {
            let record = results.entry(session_id.clone()).or_default();
            record.meta = Some(meta);
            Change::Persist(record.clone())
        })
        .await
    }

    /// Snapshot of all readable records ordered by session id.
    pub async fn records(&self) -> Vec<(SessionId, ProgressRecord)> {
        self.cache
            .lock()
            .await
            .records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    pub(crate) async fn modify<R>(&self, f: impl FnOnce(&mut Results) -> Change<R>) -> R {
        let mut cache = self.cache.lock().await;
        match f(&mut cache.records) {
            Change::Persist(value) => {
                let Cache {
                    records,
                    unreadable,
                } = &mut *cache;
                unreadable.retain(|session_id, _| !records.contains_key(session_id));
                self.codec.write_json(keys::RESULTS, &*cache).await;
                value
            }
            Change::Unchanged(value) => value,
        }
    }
}
