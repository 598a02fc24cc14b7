//! Remote history backend: Firestore REST transport and its typed-value codec.

pub mod value;

#[cfg(feature = "http")]
pub mod firestore;

#[cfg(feature = "http")]
pub use firestore::{FirestoreBackend, FirestoreConfig, FirestoreError};
