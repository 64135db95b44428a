//! JSON file storage backend.
//!
//! The whole store is one JSON document (see [`Snapshot`]) kept in memory.
//! Every mutation runs under a single async mutex and is persisted by writing
//! a sibling temp file and renaming it over the original, so readers of the
//! file never observe a partial write and concurrent requests cannot lose
//! each other's updates.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{compare_values, now_timestamp, Entity, Filter, Snapshot, StoreError, StoreResult};

#[derive(Clone)]
pub struct JsonStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    snapshot: Mutex<Snapshot>,
}

impl JsonStore {
    /// Open the store at `path`, creating an empty document if the file is missing.
    ///
    /// A file that exists but cannot be parsed is an error; it is never
    /// silently replaced.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let snapshot = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
                table: "document",
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Creating new JSON store at {}", path.display());
                let snapshot = Snapshot::default();
                write_atomic(path, &snapshot).await?;
                snapshot
            }
            Err(e) => return Err(e.into()),
        };

        info!("Opened JSON store at {}", path.display());
        Ok(Self {
            inner: Arc::new(Inner {
                path: path.to_path_buf(),
                snapshot: Mutex::new(snapshot),
            }),
        })
    }

    /// Replace the whole document, e.g. with the export of another store
    pub async fn import(&self, snapshot: Snapshot) -> StoreResult<()> {
        let mut guard = self.inner.snapshot.lock().await;
        write_atomic(&self.inner.path, &snapshot).await?;
        *guard = snapshot;
        Ok(())
    }

    /// Id the next created `T` will get
    pub async fn next_id<T: Entity>(&self) -> StoreResult<i64> {
        let guard = self.inner.snapshot.lock().await;
        Ok(peek_next_id(&guard, T::TABLE))
    }

    pub async fn list<T: Entity>(&self, filter: Option<Filter>) -> StoreResult<Vec<T>> {
        let guard = self.inner.snapshot.lock().await;
        let Some(records) = guard.collections.get(T::TABLE) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<&Value> = records
            .iter()
            .filter(|r| filter.map_or(true, |f| f.matches(r)))
            .collect();

        let order = T::ORDER;
        matching.sort_by(|a, b| {
            let by_column = compare_values(a.get(order.column), b.get(order.column))
                .then_with(|| compare_values(a.get("id"), b.get("id")));
            if order.descending {
                by_column.reverse()
            } else {
                by_column
            }
        });

        matching.into_iter().map(|r| decode::<T>(r)).collect()
    }

    pub async fn get<T: Entity>(&self, id: i64) -> StoreResult<Option<T>> {
        let guard = self.inner.snapshot.lock().await;
        guard
            .collections
            .get(T::TABLE)
            .and_then(|records| find(records, id))
            .map(|r| decode::<T>(r))
            .transpose()
    }

    pub async fn create<T: Entity>(&self, input: T::Input) -> StoreResult<T> {
        let mut guard = self.inner.snapshot.lock().await;
        let mut next = guard.clone();

        let id = next_id(&mut next, T::TABLE);
        let now = now_timestamp();
        let record = T::build(id, input, &now, &now);
        next.collections
            .entry(T::TABLE.to_string())
            .or_default()
            .push(serde_json::to_value(&record)?);

        write_atomic(&self.inner.path, &next).await?;
        *guard = next;

        debug!(table = T::TABLE, id, "Record created in JSON store");
        Ok(record)
    }

    pub async fn update<T: Entity>(&self, id: i64, input: T::Input) -> StoreResult<Option<T>> {
        let mut guard = self.inner.snapshot.lock().await;
        let mut next = guard.clone();

        let Some(records) = next.collections.get_mut(T::TABLE) else {
            return Ok(None);
        };
        let Some(slot) = records.iter_mut().find(|r| record_id(r) == Some(id)) else {
            return Ok(None);
        };

        let existing = decode::<T>(slot)?;
        let record = T::build(id, input, existing.created_at(), &now_timestamp());
        *slot = serde_json::to_value(&record)?;

        write_atomic(&self.inner.path, &next).await?;
        *guard = next;

        Ok(Some(record))
    }

    pub async fn delete<T: Entity>(&self, id: i64) -> StoreResult<bool> {
        let mut guard = self.inner.snapshot.lock().await;
        let mut next = guard.clone();

        let Some(records) = next.collections.get_mut(T::TABLE) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Ok(false);
        }

        write_atomic(&self.inner.path, &next).await?;
        *guard = next;
        Ok(true)
    }

    pub async fn settings(&self) -> StoreResult<BTreeMap<String, Value>> {
        Ok(self.inner.snapshot.lock().await.settings.clone())
    }

    pub async fn save_settings(&self, values: BTreeMap<String, Value>) -> StoreResult<()> {
        let mut guard = self.inner.snapshot.lock().await;
        let mut next = guard.clone();
        next.settings.extend(values);

        write_atomic(&self.inner.path, &next).await?;
        *guard = next;
        Ok(())
    }
}

fn record_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

fn find(records: &[Value], id: i64) -> Option<&Value> {
    records.iter().find(|r| record_id(r) == Some(id))
}

fn decode<T: Entity>(record: &Value) -> StoreResult<T> {
    T::deserialize(record).map_err(|source| StoreError::Decode {
        table: T::TABLE,
        source,
    })
}

/// Id the next record of `table` will get, without allocating it.
///
/// Documents written by hand without counters resume after the largest id.
fn peek_next_id(snapshot: &Snapshot, table: &str) -> i64 {
    let max_existing = snapshot
        .collections
        .get(table)
        .map(|records| records.iter().filter_map(record_id).max().unwrap_or(0))
        .unwrap_or(0);

    let counter = snapshot.next_ids.get(table).copied().unwrap_or(1);
    counter.max(max_existing + 1)
}

/// Allocate the next id for a collection.
///
/// Counters only move forward, so ids of deleted records are never reused.
fn next_id(snapshot: &mut Snapshot, table: &str) -> i64 {
    let id = peek_next_id(snapshot, table);
    snapshot.next_ids.insert(table.to_string(), id + 1);
    id
}

/// Serialize `snapshot` next to `path` and rename it into place
async fn write_atomic(path: &Path, snapshot: &Snapshot) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> StoreResult<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        GalleryItem, GalleryItemInput, Mission, MissionInput, TeamMember, TeamMemberInput,
    };
    use serde_json::json;

    fn mission(title: &str) -> MissionInput {
        MissionInput {
            title: title.to_string(),
            location: "Cusco".to_string(),
            country: Some("Peru".to_string()),
            description: String::new(),
            image_url: None,
            status: "ongoing".to_string(),
            start_date: None,
            end_date: None,
            animals_treated: 150,
            volunteers: 8,
            highlights: vec![],
        }
    }

    fn member(name: &str, order: i64) -> TeamMemberInput {
        TeamMemberInput {
            name: name.to_string(),
            role: "Veterinarian".to_string(),
            bio: None,
            image_url: None,
            display_order: order,
        }
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        JsonStore::open(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Decode { .. })));
        // The broken file is left for the operator to inspect
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_crud_round_trip_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = JsonStore::open(&path).await.unwrap();
        let created: Mission = store.create(mission("Cusco spring")).await.unwrap();
        assert_eq!(created.id, 1);

        let updated: Mission = store
            .update(created.id, mission("Cusco autumn"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.created_at, created.created_at);

        // A fresh handle sees what the first one wrote
        let reopened = JsonStore::open(&path).await.unwrap();
        let fetched: Mission = reopened.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Cusco autumn");
        assert_eq!(fetched.animals_treated, 150);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&dir.path().join("store.json")).await.unwrap();

        let first: Mission = store.create(mission("one")).await.unwrap();
        let second: Mission = store.create(mission("two")).await.unwrap();
        assert!(store.delete::<Mission>(second.id).await.unwrap());

        let third: Mission = store.create(mission("three")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_delete_and_update_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&dir.path().join("store.json")).await.unwrap();

        assert!(!store.delete::<Mission>(9).await.unwrap());
        assert!(store.update::<Mission>(9, mission("x")).await.unwrap().is_none());
        assert!(store.get::<Mission>(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&dir.path().join("store.json")).await.unwrap();

        for (title, mission_id) in [("a", Some(1)), ("b", None), ("c", Some(1))] {
            store
                .create::<GalleryItem>(GalleryItemInput {
                    title: title.to_string(),
                    description: None,
                    image_url: "/uploads/x.jpg".to_string(),
                    category: None,
                    mission_id,
                })
                .await
                .unwrap();
        }

        let items: Vec<GalleryItem> = store
            .list(Some(Filter::int("mission_id", 1)))
            .await
            .unwrap();
        // Newest first; equal timestamps fall back to id
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);

        store.create::<TeamMember>(member("Ana", 2)).await.unwrap();
        store.create::<TeamMember>(member("Ben", 1)).await.unwrap();
        let team: Vec<TeamMember> = store.list(None).await.unwrap();
        assert_eq!(team[0].name, "Ben");
        assert_eq!(team[1].name, "Ana");
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonStore::open(&path).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create::<TeamMember>(member(&format!("member-{i}"), i))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reopened = JsonStore::open(&path).await.unwrap();
        let team: Vec<TeamMember> = reopened.list(None).await.unwrap();
        assert_eq!(team.len(), 20);
    }

    #[tokio::test]
    async fn test_hand_written_document_resumes_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let doc = json!({
            "collections": {
                "team": [{
                    "id": 7, "name": "Cleo", "role": "Nurse", "bio": null,
                    "image_url": null, "display_order": 0,
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": "2024-01-01T00:00:00Z"
                }]
            }
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let store = JsonStore::open(&path).await.unwrap();
        let created: TeamMember = store.create(member("Dev", 1)).await.unwrap();
        assert_eq!(created.id, 8);
    }

    #[tokio::test]
    async fn test_settings_merge() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&dir.path().join("store.json")).await.unwrap();

        let mut first = BTreeMap::new();
        first.insert("contact_phone".to_string(), json!("+1 555 0100"));
        first.insert("show_donate_banner".to_string(), json!(true));
        store.save_settings(first).await.unwrap();

        let mut second = BTreeMap::new();
        second.insert("show_donate_banner".to_string(), json!(false));
        store.save_settings(second).await.unwrap();

        let settings = store.settings().await.unwrap();
        assert_eq!(settings["contact_phone"], json!("+1 555 0100"));
        assert_eq!(settings["show_donate_banner"], json!(false));
    }
}
