use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::repository::KeyValueStore;

/// JSON values over a `KeyValueStore`.
///
/// Nothing here fails loudly: a missing key, an unreadable backend and malformed
/// JSON all read as `None`, and a failed write is logged and dropped. Callers treat
/// storage as best effort.
#[derive(Clone)]
pub struct StorageCodec {
    store: Arc<dyn KeyValueStore>,
}

impl StorageCodec {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "failed to read stored value");
                return None;
            }
        };
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "failed to parse stored value");
                None
            }
        }
    }

    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                error!(key, error = %err, "failed to serialize value");
                return;
            }
        };
        if let Err(err) = self.store.set(key, &raw).await {
            error!(key, error = %err, "failed to persist value");
        }
    }

    pub async fn remove(&self, key: &str) {
        if let Err(err) = self.store.remove(key).await {
            error!(key, error = %err, "failed to remove value");
        }
    }
}
