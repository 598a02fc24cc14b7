//! Storage layer: remote document store (preferred) with a local slot store as
//! fallback and offline mode.

mod error;
pub use error::StoreError;

pub mod local;
pub mod records;
pub mod remote;

pub use local::LocalStore;
pub use records::{Backend, ClearOutcome, HISTORY_SLOT, RecordStore};
pub use remote::{RemoteBackend, RemoteHandle};
