use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::FileError;

/// Parsed contents of `path`, or `None` when the file does not exist.
pub(crate) async fn read_json_file(path: &Path) -> Result<Option<Value>, FileError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Copy of `session` carrying `receivedAt`. Non-object entries keep only the stamp.
fn stamp(session: Value, received_at: &str) -> Value {
    let mut object = match session {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    object.insert("receivedAt".to_owned(), Value::String(received_at.to_owned()));
    Value::Object(object)
}

/// Append-only JSON array file of received sync payloads.
#[derive(Debug)]
pub struct SyncLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SyncLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current log contents; a missing file reads as `[]`.
    ///
    /// # Errors
    ///
    /// Returns `FileError` if the file exists but cannot be read or parsed.
    pub async fn entries(&self) -> Result<Value, FileError> {
        Ok(read_json_file(&self.path)
            .await?
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }

    /// Stamp every session with `received_at` and append them, returning how many were
    /// stored. Concurrent appends are serialized.
    ///
    /// # Errors
    ///
    /// Returns `FileError` if the existing log is unreadable or not an array, or the
    /// rewrite fails.
    pub async fn append(&self, sessions: Vec<Value>, received_at: &str) -> Result<usize, FileError> {
        let _guard = self.lock.lock().await;

        let mut entries = match read_json_file(&self.path).await? {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(FileError::NotAnArray),
        };
        let stored = sessions.len();
        entries.extend(sessions.into_iter().map(|session| stamp(session, received_at)));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let pretty = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, pretty).await?;
        Ok(stored)
    }
}
