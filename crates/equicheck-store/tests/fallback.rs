//! History persistence behaviour in both backend modes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use equicheck_core::{AnalysisResult, Discrepancy};
use equicheck_store::{
    Backend, LocalStore, RecordStore, RemoteBackend, RemoteHandle, StoreError,
};

/// In-process remote backend ordered by record timestamp, like a server-side
/// `createdAt` index. Writes and reads can be switched to fail, and every call
/// is counted.
#[derive(Default)]
struct MemoryRemote {
    docs: Mutex<Vec<(String, AnalysisResult)>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    inserts: AtomicUsize,
    lists: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryRemote {
    fn new() -> Self {
        Self::default()
    }

    fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn set_read_failure(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of stored documents.
    fn len(&self) -> usize {
        self.docs.lock().map(|d| d.len()).unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `insert` calls, successful or not.
    fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of `list_newest_first` calls, successful or not.
    fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Stored record ids in insertion order.
    fn ids(&self) -> Vec<String> {
        self.docs
            .lock()
            .map(|d| d.iter().map(|(_, r)| r.id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteBackend for MemoryRemote {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, record: &AnalysisResult) -> Result<String, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::RemoteWriteFailed("simulated write failure".into()));
        }
        let doc_id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.docs
            .lock()
            .map_err(|_| StoreError::RemoteWriteFailed("lock poisoned".into()))?
            .push((doc_id.clone(), record.clone()));
        Ok(doc_id)
    }

    async fn list_newest_first(&self) -> Result<Vec<AnalysisResult>, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::RemoteReadFailed("simulated read failure".into()));
        }
        let docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::RemoteReadFailed("lock poisoned".into()))?;
        let mut records: Vec<AnalysisResult> = docs.iter().map(|(_, r)| r.clone()).collect();
        // Stable sort: equal timestamps keep later inserts first.
        records.reverse();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

fn record(id: &str, timestamp: i64) -> AnalysisResult {
    AnalysisResult {
        id: id.into(),
        timestamp,
        buy_side_file_name: "Project Falcon - Buy Side DD.pdf".into(),
        sell_side_file_name: "Project Falcon - CIM.pdf".into(),
        executive_summary: "Kill: sell-side EBITDA relies on one-time gains.".into(),
        risk_score: 85,
        agreement_score: 35,
        strategic_alignment: "Regional vs global market narrative".into(),
        key_risks: vec![
            "Artificial EBITDA inflation".into(),
            "Undisclosed legal action".into(),
        ],
        discrepancies: vec![Discrepancy {
            category: "Legal".into(),
            topic: "Pending litigation".into(),
            buy_side_claim: "Class action filed March 2024".into(),
            sell_side_claim: "No pending or threatened litigation".into(),
            severity: "Critical".into(),
            reasoning: "Material liability omitted from the memorandum".into(),
        }],
    }
}

fn local_only() -> RecordStore {
    RecordStore::local_only_in_memory()
}

fn with_remote() -> (RecordStore, Arc<MemoryRemote>) {
    let remote = Arc::new(MemoryRemote::new());
    let handle = RemoteHandle::connected(remote.clone() as Arc<dyn RemoteBackend>);
    (RecordStore::new(handle, LocalStore::in_memory()), remote)
}

fn ids(records: &[AnalysisResult]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

// ── Round trip ──

#[tokio::test]
async fn round_trip_local_only() {
    let store = local_only();
    let r = record("r1", 1000);
    store.save(&r).await.unwrap();
    let all = store.list_all().await.unwrap();
    assert_eq!(all.first(), Some(&r));
}

#[tokio::test]
async fn round_trip_with_remote() {
    let (store, remote) = with_remote();
    assert_eq!(store.backend(), Backend::Remote);
    let r = record("r1", 1000);
    store.save(&r).await.unwrap();
    assert_eq!(remote.len(), 1);
    assert!(store.list_local().await.unwrap().is_empty());
    let all = store.list_all().await.unwrap();
    assert_eq!(all.first(), Some(&r));
}

// ── Ordering ──

async fn assert_n_newest_first(store: &RecordStore) {
    const N: i64 = 7;
    for i in 0..N {
        store.save(&record(&format!("r{i}"), 1000 * (i + 1))).await.unwrap();
    }
    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), N as usize);
    for pair in all.windows(2) {
        assert!(
            pair[0].timestamp > pair[1].timestamp,
            "{} ({}) should be newer than {} ({})",
            pair[0].id,
            pair[0].timestamp,
            pair[1].id,
            pair[1].timestamp
        );
    }
}

#[tokio::test]
async fn n_records_newest_first_local_only() {
    assert_n_newest_first(&local_only()).await;
}

#[tokio::test]
async fn n_records_newest_first_with_remote() {
    let (store, _remote) = with_remote();
    assert_n_newest_first(&store).await;
}

// ── Clear ──

#[tokio::test]
async fn clear_empties_local_only_store() {
    let store = local_only();
    store.save(&record("r1", 1000)).await.unwrap();
    store.clear().await.unwrap();
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_never_touches_remote() {
    let (store, remote) = with_remote();
    store.save(&record("r1", 1000)).await.unwrap();
    store.save(&record("r2", 2000)).await.unwrap();
    let inserts = remote.insert_calls();
    let lists = remote.list_calls();

    let outcome = store.clear().await.unwrap();
    assert!(outcome.remote_retained);

    assert_eq!(remote.ids(), vec!["r1", "r2"]);
    assert_eq!(remote.insert_calls(), inserts);
    assert_eq!(remote.list_calls(), lists);
    // Remote history is still served after a clear.
    assert_eq!(ids(&store.list_all().await.unwrap()), vec!["r2", "r1"]);
}

// ── Degradation ──

#[tokio::test]
async fn remote_write_failure_lands_in_local_store() {
    let (store, remote) = with_remote();
    remote.set_write_failure(true);

    let r = record("r1", 1000);
    store.save(&r).await.unwrap();
    assert_eq!(remote.insert_calls(), 1);
    assert!(remote.is_empty());

    // Force the read offline too: the record must come back from local.
    remote.set_read_failure(true);
    let all = store.list_all().await.unwrap();
    assert_eq!(all, vec![r]);
    assert_eq!(remote.list_calls(), 1);
}

#[tokio::test]
async fn remote_read_failure_serves_local_history() {
    let (store, remote) = with_remote();
    store.save_local(&record("local-1", 500)).await.unwrap();
    store.save(&record("remote-1", 1000)).await.unwrap();

    assert_eq!(ids(&store.list_all().await.unwrap()), vec!["remote-1"]);
    remote.set_read_failure(true);
    assert_eq!(ids(&store.list_all().await.unwrap()), vec!["local-1"]);
}

#[tokio::test]
async fn duplicate_saves_create_duplicate_remote_records() {
    let (store, remote) = with_remote();
    let r = record("r1", 1000);
    store.save(&r).await.unwrap();
    store.save(&r).await.unwrap();
    assert_eq!(remote.len(), 2);
}

// ── End to end ──

#[tokio::test]
async fn end_to_end_local_only_example() {
    let store = local_only();

    let r1 = record("r1", 1000);
    store.save(&r1).await.unwrap();
    let all = store.list_all().await.unwrap();
    assert_eq!(ids(&all), vec!["r1"]);
    assert_eq!(all[0].risk_score, 85);
    assert_eq!(all[0].discrepancies[0].category.as_str(), "Legal");
    assert_eq!(all[0].discrepancies[0].severity.as_str(), "Critical");

    let r2 = record("r2", 2000);
    store.save(&r2).await.unwrap();
    assert_eq!(ids(&store.list_all().await.unwrap()), vec!["r2", "r1"]);
}

#[tokio::test]
async fn file_backed_history_survives_reopen() {
    let tmp = tempfile::TempDir::new().unwrap();
    {
        let store = RecordStore::new(
            RemoteHandle::disabled("offline"),
            LocalStore::open(tmp.path()),
        );
        store.save(&record("r1", 1000)).await.unwrap();
        store.save(&record("r2", 2000)).await.unwrap();
    }
    let reopened = RecordStore::new(
        RemoteHandle::disabled("offline"),
        LocalStore::open(tmp.path()),
    );
    assert_eq!(ids(&reopened.list_all().await.unwrap()), vec!["r2", "r1"]);
}

#[tokio::test]
async fn local_write_failure_surfaces_persistence_failed() {
    let tmp = tempfile::TempDir::new().unwrap();
    // A regular file where the data directory should be makes every write fail.
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let store = RecordStore::new(
        RemoteHandle::disabled("offline"),
        LocalStore::open(&blocker),
    );
    let err = store.save(&record("r1", 1000)).await.unwrap_err();
    assert!(matches!(err, StoreError::PersistenceFailed(_)));
    assert!(!err.is_remote());
}
