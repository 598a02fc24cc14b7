//! Runtime settings, resolved once at startup.
//!
//! The remote history backend is decided here and never re-evaluated: both
//! Firebase settings present means Firestore, anything else means local-only.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use equicheck_ai::{GeminiClient, GeminiConfig};
use equicheck_store::{LocalStore, RecordStore, RemoteHandle};
use equicheck_sync::{FirestoreBackend, FirestoreConfig};
use tracing::{info, warn};

/// Raw option values, typically from CLI flags or the environment.
#[derive(Default, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub firebase_api_key: Option<String>,
    pub firebase_project_id: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Settings")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("firebase_api_key", &redact(&self.firebase_api_key))
            .field("firebase_project_id", &self.firebase_project_id)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl Settings {
    /// Gemini client, or an error if the API key is missing.
    ///
    /// Only `analyze` needs this, so history commands work without a key.
    pub fn gemini_client(&self) -> anyhow::Result<GeminiClient> {
        let mut config = GeminiConfig::new(self.api_key.as_deref().unwrap_or_default())?;
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            config = config.with_model(model.trim());
        }
        Ok(GeminiClient::new(config))
    }

    /// The remote backend handle: connected when Firebase is configured,
    /// disabled with the reason otherwise.
    pub fn remote_handle(&self) -> RemoteHandle {
        match FirestoreConfig::from_parts(
            self.firebase_api_key.as_deref(),
            self.firebase_project_id.as_deref(),
        ) {
            Ok(cfg) => RemoteHandle::connected(Arc::new(FirestoreBackend::new(cfg))),
            Err(e) => {
                warn!(reason = %e, "Firebase not configured, using local storage only");
                RemoteHandle::disabled(e.to_string())
            }
        }
    }

    /// Directory holding the local history slot.
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join("equicheck"))
            .context("no data directory on this platform; set EQUICHECK_DATA_DIR")
    }

    /// Record store wired to the configured backends.
    pub fn record_store(&self) -> anyhow::Result<RecordStore> {
        let dir = self.data_dir()?;
        let store = RecordStore::new(self.remote_handle(), LocalStore::open(&dir));
        info!(
            backend = store.backend().as_str(),
            data_dir = %dir.display(),
            "history store ready"
        );
        Ok(store)
    }
}
