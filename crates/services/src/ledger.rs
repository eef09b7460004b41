use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use patrol_core::model::Ledger;
use reqwest::Client;
use reqwest::header::CACHE_CONTROL;
use storage::{StorageCodec, keys};
use tracing::{info, warn};

use crate::error::LedgerFetchError;

/// Where a fresh ledger comes from.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetch and parse the ledger.
    ///
    /// # Errors
    ///
    /// Returns `LedgerFetchError` when the source is unreachable, answers with a
    /// non-success status, or serves an unparsable document.
    async fn fetch(&self) -> Result<Ledger, LedgerFetchError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// Ledger served over HTTP, e.g. the mock server's `/api/ledger`.
#[derive(Clone)]
pub struct HttpLedgerSource {
    client: Client,
    url: String,
}

impl HttpLedgerSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LedgerSource for HttpLedgerSource {
    async fn fetch(&self) -> Result<Ledger, LedgerFetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LedgerFetchError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        Ok(Ledger::from_json(&body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Ledger read from a local JSON file.
#[derive(Clone, Debug)]
pub struct FileLedgerSource {
    path: PathBuf,
}

impl FileLedgerSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LedgerSource for FileLedgerSource {
    async fn fetch(&self) -> Result<Ledger, LedgerFetchError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(Ledger::from_json(&raw)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Loads the ledger with an offline fallback chain: fresh copy, then the cached
/// copy, then an empty ledger.
#[derive(Clone)]
pub struct LedgerService {
    codec: StorageCodec,
    source: Arc<dyn LedgerSource>,
}

impl LedgerService {
    #[must_use]
    pub fn new(codec: StorageCodec, source: Arc<dyn LedgerSource>) -> Self {
        Self { codec, source }
    }

    pub async fn load(&self) -> Ledger {
        let cached: Option<Ledger> = self.codec.read_json(keys::LEDGER).await;

        match self.source.fetch().await {
            Ok(ledger) => {
                info!(
                    source = %self.source.describe(),
                    attributes = ledger.attributes.len(),
                    "ledger fetched"
                );
                self.codec.write_json(keys::LEDGER, &ledger).await;
                ledger
            }
            Err(err) => {
                warn!(
                    source = %self.source.describe(),
                    error = %err,
                    cached = cached.is_some(),
                    "ledger fetch failed; falling back"
                );
                cached.unwrap_or_default()
            }
        }
    }
}
