//! Append-only charge ledger.
//!
//! One entry is written per charged unit, for audit and reconciliation.
//! The trait abstracts the backing store so tests run against an in-memory
//! ledger while production appends to a platform dataset.

use async_trait::async_trait;
use tracing::debug;

use ppe_billing_client::{ClientError, DatasetInfo, PlatformClient};
use ppe_billing_core::LedgerEntry;

/// Key-value record under which the ledger's dataset handle is persisted.
///
/// The ledger uses an unnamed dataset, so its id must survive restarts to
/// avoid creating a duplicate dataset after a crash/resume.
pub const LEDGER_DATASET_RECORD_KEY: &str = "LEDGER_DATASET_INFO";

/// Errors that can occur when appending to the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The backing store rejected the append.
    #[error("ledger backend error: {0}")]
    Backend(#[from] ClientError),
}

/// An append-only, order-preserving store of charge ledger entries.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append entries in order.
    ///
    /// A failed append leaves the already-committed charge in place; the
    /// charging manager logs the audit gap and moves on.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write.
    async fn append(&self, entries: Vec<LedgerEntry>) -> Result<(), LedgerError>;
}

/// Ledger backed by a platform dataset.
#[derive(Debug, Clone)]
pub struct DatasetLedger {
    client: PlatformClient,
    dataset_id: String,
}

impl DatasetLedger {
    /// Resolve the backing dataset and open the ledger.
    ///
    /// Reuses the dataset persisted under [`LEDGER_DATASET_RECORD_KEY`] in
    /// the run's key-value store if one exists; otherwise creates an
    /// unnamed dataset and persists its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the key-value store or dataset API calls fail.
    pub async fn open(client: PlatformClient, store_id: &str) -> Result<Self, ClientError> {
        let persisted: Option<DatasetInfo> = client
            .get_record(store_id, LEDGER_DATASET_RECORD_KEY)
            .await?;

        let info = match persisted {
            Some(info) => {
                debug!(dataset_id = %info.id, "reusing persisted ledger dataset");
                info
            }
            None => {
                let info = client.create_dataset().await?;
                client
                    .set_record(store_id, LEDGER_DATASET_RECORD_KEY, &info)
                    .await?;
                debug!(dataset_id = %info.id, "created ledger dataset");
                info
            }
        };

        Ok(Self {
            client,
            dataset_id: info.id,
        })
    }

    /// The id of the backing dataset.
    #[must_use]
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }
}

#[async_trait]
impl Ledger for DatasetLedger {
    async fn append(&self, entries: Vec<LedgerEntry>) -> Result<(), LedgerError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.client.push_items(&self.dataset_id, &entries).await?;
        Ok(())
    }
}

/// In-memory ledger for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: std::sync::Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    /// Create an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries appended so far, in write order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().expect("ledger lock poisoned").clone()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append(&self, mut entries: Vec<LedgerEntry>) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .expect("ledger lock poisoned")
            .append(&mut entries);
        Ok(())
    }
}
