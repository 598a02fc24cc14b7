//! Analysis history: remote-preferred, local-fallback persistence.
//!
//! Every operation tries the remote backend first and falls through to the
//! local slot on any remote failure, including "no remote configured". The
//! fallback is silent: callers never learn which backend served them. Only a
//! failure of the local path itself is reported, as
//! [`StoreError::PersistenceFailed`].
//!
//! The remote attempt and the local fallback are separate public functions
//! ([`save_remote`](RecordStore::save_remote) /
//! [`save_local`](RecordStore::save_local), and the same for listing) so
//! each branch can be driven on its own.

use std::fmt;

use equicheck_core::AnalysisResult;
use tracing::{info, warn};

use crate::local::LocalStore;
use crate::remote::RemoteHandle;
use crate::StoreError;

/// Slot holding the JSON array of records, newest first.
pub const HISTORY_SLOT: &str = "equicheck_analyses";

/// Which backend a store prefers, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Remote,
    LocalOnly,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::LocalOnly => "local-only",
        }
    }
}

/// What `clear` did. Remote history is never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOutcome {
    /// Number of locally stored records that were removed.
    pub removed: usize,
    /// Always true: remote records, if any, are left intact.
    pub remote_retained: bool,
}

impl fmt::Display for ClearOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Local history cleared ({} record{} removed). Remote history, if any, remains intact.",
            self.removed,
            if self.removed == 1 { "" } else { "s" }
        )
    }
}

/// Persists and retrieves [`AnalysisResult`] records.
pub struct RecordStore {
    remote: RemoteHandle,
    local: LocalStore,
}

impl RecordStore {
    pub fn new(remote: RemoteHandle, local: LocalStore) -> Self {
        Self { remote, local }
    }

    /// A store with no remote backend and an in-memory local slot.
    pub fn local_only_in_memory() -> Self {
        Self::new(
            RemoteHandle::disabled("no remote backend configured"),
            LocalStore::in_memory(),
        )
    }

    pub fn backend(&self) -> Backend {
        if self.remote.is_connected() {
            Backend::Remote
        } else {
            Backend::LocalOnly
        }
    }

    pub fn remote(&self) -> &RemoteHandle {
        &self.remote
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Persist a record, remote first, local on any remote failure.
    pub async fn save(&self, record: &AnalysisResult) -> Result<(), StoreError> {
        match self.save_remote(record).await {
            Ok(doc_id) => {
                info!(id = %record.id, doc_id = %doc_id, "analysis saved to remote store");
                Ok(())
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "remote save failed, falling back to local store");
                self.save_local(record).await
            }
        }
    }

    /// All records newest first, remote first, local on any remote failure.
    pub async fn list_all(&self) -> Result<Vec<AnalysisResult>, StoreError> {
        match self.list_remote().await {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(error = %e, "remote fetch failed, falling back to local store");
                self.list_local().await
            }
        }
    }

    /// Remove the local history. Never deletes remote records.
    pub async fn clear(&self) -> Result<ClearOutcome, StoreError> {
        let removed = self.list_local().await?.len();
        self.local
            .remove(HISTORY_SLOT)
            .await
            .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;
        info!(removed, "local history cleared; remote history untouched");
        Ok(ClearOutcome {
            removed,
            remote_retained: true,
        })
    }

    /// Single insert against the remote backend.
    pub async fn save_remote(&self, record: &AnalysisResult) -> Result<String, StoreError> {
        let backend = self.remote.backend()?;
        backend.insert(record).await
    }

    /// Query-all against the remote backend.
    pub async fn list_remote(&self) -> Result<Vec<AnalysisResult>, StoreError> {
        let backend = self.remote.backend()?;
        backend.list_newest_first().await
    }

    /// Prepend a record to the local history and overwrite the slot.
    ///
    /// A corrupt slot is replaced, but a slot that cannot be read at all is
    /// left untouched and the save fails.
    pub async fn save_local(&self, record: &AnalysisResult) -> Result<(), StoreError> {
        let existing = self
            .local
            .get(HISTORY_SLOT)
            .await
            .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;
        let mut records = existing.as_deref().map(parse_history).unwrap_or_default();
        records.insert(0, record.clone());
        let json = serde_json::to_string(&records)
            .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;
        self.local
            .set(HISTORY_SLOT, &json)
            .await
            .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;
        info!(id = %record.id, count = records.len(), "analysis saved to local store");
        Ok(())
    }

    /// The local history verbatim, newest first.
    ///
    /// An absent, unreadable, or corrupt slot reads as empty.
    pub async fn list_local(&self) -> Result<Vec<AnalysisResult>, StoreError> {
        let raw = match self.local.get(HISTORY_SLOT).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                warn!(error = %e, "local history unreadable, treating as empty");
                return Ok(Vec::new());
            }
        };
        Ok(parse_history(&raw))
    }
}

fn parse_history(raw: &str) -> Vec<AnalysisResult> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, "local history corrupt, treating as empty");
        Vec::new()
    })
}
