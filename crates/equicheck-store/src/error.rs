use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No remote backend was configured or it failed to initialise.
    #[error("remote backend unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("remote write failed: {0}")]
    RemoteWriteFailed(String),

    #[error("remote read failed: {0}")]
    RemoteReadFailed(String),

    #[error("local storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The local fallback itself failed. The only error `RecordStore` surfaces.
    #[error("could not persist analysis history: {0}")]
    PersistenceFailed(String),
}

impl StoreError {
    /// Whether this error came from the remote backend.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable(_) | Self::RemoteWriteFailed(_) | Self::RemoteReadFailed(_)
        )
    }
}
