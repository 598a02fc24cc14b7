//! Remote document-store seam.
//!
//! The remote side is one logical collection of analysis records:
//! insert-only appends and a query-all ordered by creation time, newest first.
//! Whether a backend exists at all is decided once at startup and captured in
//! a [`RemoteHandle`].

use std::sync::Arc;

use async_trait::async_trait;
use equicheck_core::AnalysisResult;

use crate::StoreError;

/// A network-accessible document store for analysis records.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Short name for logs (e.g. `"firestore"`).
    fn name(&self) -> &str;

    /// Append a record. Returns the server-assigned document id.
    ///
    /// Not idempotent: inserting the same record twice stores it twice.
    async fn insert(&self, record: &AnalysisResult) -> Result<String, StoreError>;

    /// All records, ordered by creation time descending. No pagination.
    async fn list_newest_first(&self) -> Result<Vec<AnalysisResult>, StoreError>;
}

/// The remote backend as resolved at process start.
///
/// Built once and then only read. A disabled handle stays disabled for the
/// lifetime of the process; there is no reconnect.
#[derive(Clone)]
pub enum RemoteHandle {
    Disabled { reason: String },
    Connected(Arc<dyn RemoteBackend>),
}

impl RemoteHandle {
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self::Disabled {
            reason: reason.into(),
        }
    }

    pub fn connected(backend: Arc<dyn RemoteBackend>) -> Self {
        Self::Connected(backend)
    }

    /// The backend, or `RemoteUnavailable` carrying the startup reason.
    pub fn backend(&self) -> Result<&Arc<dyn RemoteBackend>, StoreError> {
        match self {
            Self::Connected(backend) => Ok(backend),
            Self::Disabled { reason } => Err(StoreError::RemoteUnavailable(reason.clone())),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled { reason } => f.debug_struct("Disabled").field("reason", reason).finish(),
            Self::Connected(b) => f.debug_tuple("Connected").field(&b.name()).finish(),
        }
    }
}
