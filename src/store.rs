//! Record store
//!
//! Holds the four record collections (`cabinets`, `files`, `documents`,
//! `fileTypes`) as one immutable [`Snapshot`]. Every write builds a new
//! snapshot that replaces the previous one wholesale and is broadcast to
//! subscribers; readers never see a partially applied write.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::entity::{Cabinet, DocumentRecord, FileRecord, FileType, StorageItem};
use crate::error::StoreError;
use crate::placement::{move_item, MoveTarget};

/// Connection state of the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Disconnected,
    Syncing,
    Live,
}

/// All four collections at one revision
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub revision: u64,
    #[serde(default, deserialize_with = "collection")]
    pub cabinets: BTreeMap<String, Cabinet>,
    #[serde(default, deserialize_with = "collection")]
    pub files: BTreeMap<String, FileRecord>,
    #[serde(default, deserialize_with = "collection")]
    pub documents: BTreeMap<String, DocumentRecord>,
    #[serde(default, deserialize_with = "collection")]
    pub file_types: BTreeMap<String, FileType>,
}

impl Snapshot {
    pub fn cabinet(&self, id: &str) -> Option<&Cabinet> {
        self.cabinets.get(id)
    }

    pub fn file_type(&self, id: &str) -> Option<&FileType> {
        self.file_types.get(id)
    }

    /// Copy collection keys into the records' id fields
    fn assign_ids(&mut self) {
        assign(&mut self.cabinets);
        assign(&mut self.files);
        assign(&mut self.documents);
        assign(&mut self.file_types);
    }
}

fn assign<R: Record>(records: &mut BTreeMap<String, R>) {
    for (id, record) in records.iter_mut() {
        record.set_id(id.clone());
    }
}

/// Decode a collection, skipping records that are not objects of the right shape
fn collection<'de, D, R>(deserializer: D) -> Result<BTreeMap<String, R>, D::Error>
where
    D: Deserializer<'de>,
    R: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };
    let mut records = BTreeMap::new();
    for (id, entry) in entries {
        match serde_json::from_value::<R>(entry) {
            Ok(record) => {
                records.insert(id, record);
            }
            Err(e) => warn!("Skipping unreadable record {}: {}", id, e),
        }
    }
    Ok(records)
}

/// A record kind stored in one snapshot collection
pub trait Record: Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn set_id(&mut self, id: String);
    fn records(snapshot: &Snapshot) -> &BTreeMap<String, Self>;
    fn records_mut(snapshot: &mut Snapshot) -> &mut BTreeMap<String, Self>;
}

macro_rules! impl_record {
    ($ty:ty, $collection:literal, $field:ident) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn records(snapshot: &Snapshot) -> &BTreeMap<String, Self> {
                &snapshot.$field
            }

            fn records_mut(snapshot: &mut Snapshot) -> &mut BTreeMap<String, Self> {
                &mut snapshot.$field
            }
        }
    };
}

impl_record!(Cabinet, "cabinets", cabinets);
impl_record!(FileRecord, "files", files);
impl_record!(DocumentRecord, "documents", documents);
impl_record!(FileType, "fileTypes", file_types);

/// Backing storage of snapshots
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn load(&self) -> Result<Option<Snapshot>, StoreError>;
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Snapshot persisted as one JSON document
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSink for JsonFileSink {
    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read(&self.path).await?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

/// In-memory sink, starts empty unless seeded
#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Option<Snapshot>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(snapshot: Snapshot) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl SnapshotSink for MemorySink {
    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.saved.lock().await = Some(snapshot.clone());
        Ok(())
    }
}

struct Inner {
    current: RwLock<Arc<Snapshot>>,
    state: RwLock<SyncState>,
    sink: Box<dyn SnapshotSink>,
    sender: broadcast::Sender<Arc<Snapshot>>,
}

/// Live record store shared across handlers
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<Inner>,
}

impl RecordStore {
    pub fn new(sink: impl SnapshotSink + 'static) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(Arc::new(Snapshot::default())),
                state: RwLock::new(SyncState::Disconnected),
                sink: Box::new(sink),
                sender,
            }),
        }
    }

    /// Load the persisted snapshot and go live
    pub async fn open(&self) -> Result<(), StoreError> {
        *self.inner.state.write().await = SyncState::Syncing;
        debug!("Record store syncing");

        let loaded = match self.inner.sink.load().await {
            Ok(loaded) => loaded,
            Err(e) => {
                *self.inner.state.write().await = SyncState::Disconnected;
                return Err(e);
            }
        };
        let mut snapshot = loaded.unwrap_or_default();
        snapshot.assign_ids();
        info!(
            "Record store live at revision {}: {} cabinets, {} files, {} documents, {} file types",
            snapshot.revision,
            snapshot.cabinets.len(),
            snapshot.files.len(),
            snapshot.documents.len(),
            snapshot.file_types.len()
        );

        let snapshot = Arc::new(snapshot);
        *self.inner.current.write().await = snapshot.clone();
        *self.inner.state.write().await = SyncState::Live;
        let _ = self.inner.sender.send(snapshot);
        Ok(())
    }

    pub async fn state(&self) -> SyncState {
        *self.inner.state.read().await
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.current.read().await.clone()
    }

    /// Receive every snapshot published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.inner.sender.subscribe()
    }

    /// Apply a change to a copy of the current snapshot, persist and publish it.
    ///
    /// A change returning `None` left the snapshot untouched; nothing is
    /// written and the revision stays as it was.
    async fn write<F, T>(&self, change: F) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&mut Snapshot) -> Option<T>,
    {
        if self.state().await != SyncState::Live {
            return Err(StoreError::NotLive);
        }

        let mut current = self.inner.current.write().await;
        let mut next = Snapshot::clone(&current);
        let Some(result) = change(&mut next) else {
            return Ok(None);
        };
        next.revision += 1;
        self.inner.sink.save(&next).await?;

        let next = Arc::new(next);
        *current = next.clone();
        drop(current);

        debug!("Published snapshot revision {}", next.revision);
        let _ = self.inner.sender.send(next);
        Ok(Some(result))
    }

    /// Add a record under a fresh id
    pub async fn insert<R: Record>(&self, mut record: R) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        record.set_id(id.clone());
        let key = id.clone();
        self.write(move |snapshot| {
            R::records_mut(snapshot).insert(key, record);
            Some(())
        })
        .await?;
        debug!("Inserted {}/{}", R::COLLECTION, id);
        Ok(id)
    }

    /// Write a record under an id, replacing any previous value
    pub async fn put<R: Record>(&self, id: &str, mut record: R) -> Result<(), StoreError> {
        record.set_id(id.to_string());
        let key = id.to_string();
        self.write(move |snapshot| {
            R::records_mut(snapshot).insert(key, record);
            Some(())
        })
        .await?;
        Ok(())
    }

    /// Remove a record; a missing id changes nothing
    pub async fn remove<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.write(|snapshot| R::records_mut(snapshot).remove(id))
            .await
    }

    /// Update only the placement of a file or document
    pub async fn move_item(
        &self,
        id: &str,
        target: &MoveTarget,
    ) -> Result<Option<StorageItem>, StoreError> {
        self.write(|snapshot| {
            if let Some(file) = snapshot.files.remove(id) {
                let moved = move_item(file, target);
                let item = StorageItem::from(&moved);
                snapshot.files.insert(id.to_string(), moved);
                Some(item)
            } else if let Some(doc) = snapshot.documents.remove(id) {
                let moved = move_item(doc, target);
                let item = StorageItem::from(&moved);
                snapshot.documents.insert(id.to_string(), moved);
                Some(item)
            } else {
                None
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ItemLocation;
    use serde_json::json;

    async fn live_store() -> RecordStore {
        let store = RecordStore::new(MemorySink::new());
        store.open().await.unwrap();
        store
    }

    #[test]
    fn test_fresh_store_is_empty_and_disconnected() {
        let store = RecordStore::new(MemorySink::new());
        assert_eq!(tokio_test::block_on(store.state()), SyncState::Disconnected);
        assert_eq!(tokio_test::block_on(store.snapshot()).revision, 0);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let store = RecordStore::new(MemorySink::new());
        assert_eq!(store.state().await, SyncState::Disconnected);
        assert!(matches!(
            store.insert(Cabinet::new("A", 1, 1)).await,
            Err(StoreError::NotLive)
        ));

        store.open().await.unwrap();
        assert_eq!(store.state().await, SyncState::Live);
    }

    #[tokio::test]
    async fn test_writes_publish_new_snapshots() {
        let store = live_store().await;
        let mut rx = store.subscribe();

        let before = store.snapshot().await;
        let id = store.insert(Cabinet::new("A", 2, 2)).await.unwrap();
        let published = rx.recv().await.unwrap();

        assert_eq!(published.revision, before.revision + 1);
        assert_eq!(published.cabinet(&id).unwrap().id, id);
        // The earlier snapshot is untouched
        assert!(before.cabinets.is_empty());
    }

    #[tokio::test]
    async fn test_put_is_last_write_wins() {
        let store = live_store().await;
        store.put("c1", Cabinet::new("First", 1, 1)).await.unwrap();
        store.put("c1", Cabinet::new("Second", 2, 2)).await.unwrap();
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.cabinets.len(), 1);
        assert_eq!(snapshot.cabinet("c1").unwrap().name, "Second");
    }

    #[tokio::test]
    async fn test_remove_cabinet_keeps_items() {
        let store = live_store().await;
        store.put("c1", Cabinet::new("A", 1, 1)).await.unwrap();
        let file = FileRecord {
            location: ItemLocation::new("c1", 1, 1, false),
            ..Default::default()
        };
        let file_id = store.insert(file).await.unwrap();

        let removed = store.remove::<Cabinet>("c1").await.unwrap();
        assert_eq!(removed.unwrap().name, "A");
        assert!(store.remove::<Cabinet>("c1").await.unwrap().is_none());

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.files[&file_id].location.cabinet_id, "c1");
    }

    #[tokio::test]
    async fn test_removing_missing_record_keeps_revision() {
        let store = live_store().await;
        store.put("c1", Cabinet::new("A", 1, 1)).await.unwrap();
        let mut rx = store.subscribe();

        let first = store.remove::<Cabinet>("c1");
        let second = store.remove::<Cabinet>("c1");
        let (first, second) = tokio::join!(first, second);
        let removed: Vec<_> = [first.unwrap(), second.unwrap()]
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(removed.len(), 1);

        assert_eq!(store.snapshot().await.revision, 2);
        assert_eq!(rx.recv().await.unwrap().revision, 2);
        assert!(rx.try_recv().is_err());

        let target = MoveTarget {
            cabinet_id: "c1".to_string(),
            level: 1,
            column: 1,
            is_locker: false,
        };
        assert!(store.move_item("missing", &target).await.unwrap().is_none());
        assert_eq!(store.snapshot().await.revision, 2);
    }

    #[tokio::test]
    async fn test_move_item_updates_location_only() {
        let store = live_store().await;
        let doc = DocumentRecord {
            document_number: "D-1".to_string(),
            document_type: "Deed".to_string(),
            location: ItemLocation::new("c1", 1, 1, false),
            ..Default::default()
        };
        let id = store.insert(doc).await.unwrap();
        let target = MoveTarget {
            cabinet_id: "c2".to_string(),
            level: 3,
            column: 2,
            is_locker: true,
        };

        let moved = store.move_item(&id, &target).await.unwrap().unwrap();
        assert_eq!(moved.location, ItemLocation::new("c2", 3, 2, true));

        let snapshot = store.snapshot().await;
        let stored = &snapshot.documents[&id];
        assert_eq!(stored.document_number, "D-1");
        assert_eq!(stored.location, ItemLocation::new("c2", 3, 2, true));

        assert!(store.move_item("missing", &target).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_assigns_ids_and_skips_bad_records() {
        let seeded: Snapshot = serde_json::from_value(json!({
            "cabinets": {"c1": {"name": "A", "levels": 1, "columns": 1}, "bad": 7},
            "files": null,
            "fileTypes": {"t1": {"name": "Audit"}}
        }))
        .unwrap();
        let store = RecordStore::new(MemorySink::seeded(seeded));
        store.open().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.cabinets.len(), 1);
        assert_eq!(snapshot.cabinet("c1").unwrap().id, "c1");
        assert_eq!(snapshot.file_type("t1").unwrap().id, "t1");
        assert!(snapshot.files.is_empty());
    }

    #[tokio::test]
    async fn test_json_file_sink_round_trip() {
        let path = std::env::temp_dir().join(format!("filecab-{}.json", uuid::Uuid::new_v4()));
        let store = RecordStore::new(JsonFileSink::new(&path));
        store.open().await.unwrap();
        let id = store.insert(Cabinet::new("Disk", 2, 3)).await.unwrap();

        let reopened = RecordStore::new(JsonFileSink::new(&path));
        reopened.open().await.unwrap();
        let snapshot = reopened.snapshot().await;
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.cabinet(&id).unwrap().name, "Disk");

        let _ = std::fs::remove_file(&path);
    }
}
