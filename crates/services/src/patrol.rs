use std::sync::{Arc, Mutex, PoisonError};

use patrol_core::model::{
    Attribute, ItemPatch, Ledger, ProgressRecord, Session, SessionId, SessionIdScheme, SessionMeta,
};
use storage::{StorageCodec, keys};
use tracing::{debug, info, warn};

use crate::progress::SessionProgressStore;

/// The session currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session: Session,
    pub session_id: SessionId,
    pub attribute: Attribute,
}

/// Active session together with its stored progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub active: ActiveSession,
    pub progress: ProgressRecord,
}

/// Owns the "which patrol is open" context: starting, restoring and resetting the
/// active session, and routing item edits to its progress record.
pub struct PatrolSessionService {
    codec: StorageCodec,
    store: Arc<SessionProgressStore>,
    ledger: Arc<Ledger>,
    scheme: SessionIdScheme,
    active: Mutex<Option<ActiveSession>>,
}

impl PatrolSessionService {
    #[must_use]
    pub fn new(
        codec: StorageCodec,
        store: Arc<SessionProgressStore>,
        ledger: Arc<Ledger>,
        scheme: SessionIdScheme,
    ) -> Self {
        Self {
            codec,
            store,
            ledger,
            scheme,
            active: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn scheme(&self) -> SessionIdScheme {
        self.scheme
    }

    #[must_use]
    pub fn active(&self) -> Option<ActiveSession> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Open `session`: remember it as the active session and make sure its progress
    /// record carries up-to-date metadata.
    ///
    /// Returns `None` (and changes nothing) when the attribute is not in the ledger.
    pub async fn start(&self, session: Session) -> Option<SessionSnapshot> {
        let Some(attribute) = self.ledger.attribute(session.attribute_id()).cloned() else {
            warn!(attribute_id = session.attribute_id(), "attribute not in ledger");
            return None;
        };

        if self.scheme == SessionIdScheme::Joined && session.is_ambiguous() {
            warn!(
                operator = session.operator(),
                date = session.date(),
                attribute_id = session.attribute_id(),
                "session fields contain the id separator; ids may collide"
            );
        }
        let session_id = self.scheme.session_id(&session);

        self.codec.write_json(keys::SESSION, &session).await;

        let progress = self
            .store
            .set_meta(&session_id, SessionMeta::new(&session, &attribute))
            .await;

        let active = ActiveSession {
            session,
            session_id,
            attribute,
        };
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(active.clone());
        info!(session_id = %active.session_id, "session started");

        Some(SessionSnapshot { active, progress })
    }

    /// Reopen the session stored by a previous run, if any.
    pub async fn restore(&self) -> Option<SessionSnapshot> {
        let session: Session = self.codec.read_json(keys::SESSION).await?;
        debug!(attribute_id = session.attribute_id(), "restoring stored session");
        self.start(session).await
    }

    /// Forget the active session. Stored progress is kept.
    pub async fn reset(&self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.codec.remove(keys::SESSION).await;
    }

    /// Active session with its latest progress.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let active = self.active()?;
        let progress = self.store.get_session_progress(&active.session_id).await;
        Some(SessionSnapshot { active, progress })
    }

    /// Tick or untick an item of the active session.
    pub async fn set_completed(&self, item_id: &str, completed: bool) -> Option<ProgressRecord> {
        self.update(item_id, ItemPatch::completed(completed)).await
    }

    /// Record a captured code for an item of the active session. The value is
    /// trimmed; a blank value clears the capture.
    pub async fn apply_capture(&self, item_id: &str, raw: &str) -> Option<ProgressRecord> {
        self.update(item_id, ItemPatch::capture(raw.trim())).await
    }

    async fn update(&self, item_id: &str, patch: ItemPatch) -> Option<ProgressRecord> {
        let active = self.active()?;
        Some(
            self.store
                .update_item_result(&active.session_id, item_id, &patch)
                .await,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patrol_core::model::{ChecklistItem, ItemResult};
    use patrol_core::time::fixed_clock;
    use async_trait::async_trait;
    use std::time::Duration;
    use storage::repository::{InMemoryStore, KeyValueStore, StorageError};

    /// Backend whose writes take a while, so concurrent callers overlap.
    struct SlowWrites(InMemoryStore);

    #[async_trait]
    impl KeyValueStore for SlowWrites {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key).await
        }
    }

    fn ledger() -> Ledger {
        Ledger {
            attributes: vec![Attribute {
                id: "line-a".into(),
                label: "ラインA".into(),
                items: vec![ChecklistItem {
                    id: "a-1".into(),
                    title: "消火器".into(),
                    description: "圧力計を確認".into(),
                    code: "FX-01".into(),
                }],
            }],
        }
    }

    async fn build_service(
        backing: &InMemoryStore,
    ) -> (PatrolSessionService, Arc<SessionProgressStore>) {
        let codec = StorageCodec::new(Arc::new(backing.clone()));
        let store = Arc::new(SessionProgressStore::load(fixed_clock(), codec.clone()).await);
        let service = PatrolSessionService::new(
            codec,
            Arc::clone(&store),
            Arc::new(ledger()),
            SessionIdScheme::Joined,
        );
        (service, store)
    }

    fn session() -> Session {
        Session::new("A", "2024-05-20", "line-a").unwrap()
    }

    #[tokio::test]
    async fn start_writes_metadata_and_active_pointer() {
        let backing = InMemoryStore::new();
        let (service, store) = build_service(&backing).await;

        let snapshot = service.start(session()).await.expect("known attribute");
        assert_eq!(snapshot.active.session_id.as_str(), "A__2024-05-20__line-a");
        let meta = snapshot.progress.meta.as_ref().expect("meta written");
        assert_eq!(meta.attribute_label, "ラインA");
        assert!(!snapshot.progress.synced);

        let stored = store.get_session_progress(&snapshot.active.session_id).await;
        assert_eq!(stored, snapshot.progress);
        assert!(backing.get(keys::SESSION).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_attribute_changes_nothing() {
        let backing = InMemoryStore::new();
        let (service, store) = build_service(&backing).await;
        let unknown = Session::new("A", "2024-05-20", "line-z").unwrap();

        assert!(service.start(unknown).await.is_none());
        assert!(service.active().is_none());
        assert!(store.records().await.is_empty());
        assert_eq!(backing.get(keys::SESSION).await.unwrap(), None);
    }

    #[tokio::test]
    async fn edits_go_to_the_active_session() {
        let backing = InMemoryStore::new();
        let (service, _) = build_service(&backing).await;
        assert!(service.set_completed("a-1", true).await.is_none());

        service.start(session()).await.unwrap();
        service.set_completed("a-1", true).await.unwrap();
        let record = service.apply_capture("a-1", "  FX-01  ").await.unwrap();
        let item = record.item("a-1").unwrap();
        assert!(item.completed());
        assert_eq!(item.capture(), Some("FX-01"));

        let record = service.apply_capture("a-1", "   ").await.unwrap();
        assert_eq!(record.item("a-1").and_then(ItemResult::capture), None);
    }

    #[tokio::test]
    async fn reset_keeps_progress_and_restore_reopens() {
        let backing = InMemoryStore::new();
        {
            let (service, _) = build_service(&backing).await;
            service.start(session()).await.unwrap();
            service.set_completed("a-1", true).await.unwrap();
        }

        let (service, store) = build_service(&backing).await;
        let restored = service.restore().await.expect("stored session");
        assert!(restored.progress.item("a-1").is_some_and(ItemResult::completed));

        service.reset().await;
        assert!(service.active().is_none());
        assert!(service.snapshot().await.is_none());
        assert!(service.restore().await.is_none());
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_stored_session_is_ignored() {
        let backing = InMemoryStore::new();
        backing.set(keys::SESSION, "{\"operator\":").await.unwrap();
        let (service, _) = build_service(&backing).await;
        assert!(service.restore().await.is_none());
    }

    #[tokio::test]
    async fn restarting_during_edits_loses_no_items() {
        let backing = InMemoryStore::new();
        let codec = StorageCodec::new(Arc::new(SlowWrites(backing.clone())));
        let store = Arc::new(SessionProgressStore::load(fixed_clock(), codec.clone()).await);
        let service = PatrolSessionService::new(
            codec,
            Arc::clone(&store),
            Arc::new(ledger()),
            SessionIdScheme::Joined,
        );
        service.start(session()).await.unwrap();

        let (first, restarted, second) = tokio::join!(
            service.set_completed("a-1", true),
            service.start(session()),
            service.set_completed("a-2", true),
        );
        assert!(first.is_some());
        assert!(restarted.is_some());
        assert!(second.is_some());

        let reloaded = SessionProgressStore::load(
            fixed_clock(),
            StorageCodec::new(Arc::new(backing.clone())),
        )
        .await;
        let stored = reloaded
            .get_session_progress(&SessionId::from_raw("A__2024-05-20__line-a"))
            .await;
        assert!(stored.item("a-1").is_some_and(ItemResult::completed));
        assert!(stored.item("a-2").is_some_and(ItemResult::completed));
        assert!(stored.meta.is_some());
    }
}
