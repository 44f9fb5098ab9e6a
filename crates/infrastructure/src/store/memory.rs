use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use domain::DomainError;
use domain::device::{DeviceKind, DeviceRecord, DeviceStore, RecordPatch, state};
use tokio::sync::Mutex;

#[derive(Default)]
struct Collection {
    records: Vec<DeviceRecord>,
    next_id: u64,
}

/// Process-local device collection.
///
/// Assigns sequential string ids like the REST collection does and supports
/// failure injection so callers can exercise their error paths.
#[derive(Clone)]
pub struct InMemoryDeviceStore {
    collection: Arc<Mutex<Collection>>,
    offline: Arc<AtomicBool>,
    // Creates allowed before every further create fails; usize::MAX = unlimited
    create_budget: Arc<AtomicUsize>,
    list_delay: Arc<Mutex<Option<Duration>>>,
    list_calls: Arc<AtomicUsize>,
    write_calls: Arc<AtomicUsize>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::seeded(Vec::new())
    }

    /// Store pre-filled with records; records without an id get one
    pub fn seeded(records: Vec<DeviceRecord>) -> Self {
        let mut collection = Collection::default();
        for record in records {
            collection.insert(record);
        }

        Self {
            collection: Arc::new(Mutex::new(collection)),
            offline: Arc::new(AtomicBool::new(false)),
            create_budget: Arc::new(AtomicUsize::new(usize::MAX)),
            list_delay: Arc::new(Mutex::new(None)),
            list_calls: Arc::new(AtomicUsize::new(0)),
            write_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Two entrances with an actuator and a door sensor each, plus a presence sensor
    pub fn with_demo_fleet() -> Self {
        let start = Utc::now() - ChronoDuration::minutes(5);
        let mut records = Vec::new();
        for (i, location) in ["entrada_frontal", "entrada_trasera"].iter().enumerate() {
            let at = start + ChronoDuration::seconds(i as i64);
            records.push(
                DeviceRecord::new(DeviceKind::Actuator, *location, at)
                    .with_ip(format!("192.168.1.{}", 10 + i)),
            );
            records.push(
                DeviceRecord::new(DeviceKind::Door, *location, at)
                    .with_ip(format!("192.168.1.{}", 20 + i)),
            );
        }
        records.push(
            DeviceRecord::new(DeviceKind::Presence, "pasillo", start)
                .with_state(state::NOT_DETECTED)
                .with_ip("192.168.1.30"),
        );
        Self::seeded(records)
    }

    /// While offline every operation fails with a 503
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Let `count` more creates succeed, then fail the rest
    pub fn fail_creates_after(&self, count: usize) {
        self.create_budget.store(count, Ordering::SeqCst);
    }

    pub async fn set_list_delay(&self, delay: Option<Duration>) {
        *self.list_delay.lock().await = delay;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Creates, updates and deletes that reached the collection
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub async fn records(&self) -> Vec<DeviceRecord> {
        self.collection.lock().await.records.clone()
    }

    fn check_online(&self, operation: &str) -> Result<(), DomainError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DomainError::remote_status(
                503,
                format!("{operation} failed: store offline"),
            ));
        }
        Ok(())
    }

    fn take_create_budget(&self) -> bool {
        self.create_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |budget| match budget {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Collection {
    fn insert(&mut self, mut record: DeviceRecord) -> DeviceRecord {
        match record.id.as_deref().map(str::parse::<u64>) {
            None => {
                self.next_id += 1;
                record.id = Some(self.next_id.to_string());
            }
            // Kept ids must never be handed out again
            Some(Ok(id)) => self.next_id = self.next_id.max(id),
            Some(Err(_)) => {}
        }
        self.records.push(record.clone());
        record
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn create(&self, record: &DeviceRecord) -> Result<DeviceRecord, DomainError> {
        self.check_online("create")?;
        if !self.take_create_budget() {
            return Err(DomainError::remote_status(
                500,
                "create failed: injected failure",
            ));
        }

        let mut unsaved = record.clone();
        unsaved.id = None;
        let created = self.collection.lock().await.insert(unsaved);
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<DeviceRecord>, DomainError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_online("list")?;
        Ok(self.collection.lock().await.records.clone())
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<DeviceRecord, DomainError> {
        self.check_online("update")?;
        let mut collection = self.collection.lock().await;
        let record = collection
            .records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| {
                DomainError::remote_status(404, format!("update failed: no record {id}"))
            })?;
        patch.apply(record);
        let updated = record.clone();
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.check_online("delete")?;
        let mut collection = self.collection.lock().await;
        let before = collection.records.len();
        collection.records.retain(|r| r.id.as_deref() != Some(id));
        if collection.records.len() == before {
            return Err(DomainError::remote_status(
                404,
                format!("delete failed: no record {id}"),
            ));
        }
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryDeviceStore::new();
        let record = DeviceRecord::new(DeviceKind::Door, "A", Utc::now());

        let first = store.create(&record).await.unwrap();
        let second = store.create(&record.clone().with_id("ignored")).await.unwrap();

        assert_eq!(first.id.as_deref(), Some("1"));
        assert_eq!(second.id.as_deref(), Some("2"));
        assert_eq!(store.list().await.unwrap().len(), 2);
        assert_eq!(store.write_calls(), 2);
    }

    #[tokio::test]
    async fn test_create_after_seeded_ids_does_not_reuse_them() {
        let store = InMemoryDeviceStore::seeded(vec![
            DeviceRecord::new(DeviceKind::Door, "A", Utc::now()).with_id("1"),
            DeviceRecord::new(DeviceKind::Door, "B", Utc::now()).with_id("7"),
            DeviceRecord::new(DeviceKind::Door, "C", Utc::now()).with_id("legacy"),
        ]);

        let created = store
            .create(&DeviceRecord::new(DeviceKind::Actuator, "A", Utc::now()))
            .await
            .unwrap();
        assert_eq!(created.id.as_deref(), Some("8"));

        // Deleting the new record leaves the seeded ones alone
        store.delete("8").await.unwrap();
        let ids: Vec<_> = store.records().await.into_iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                Some("1".to_string()),
                Some("7".to_string()),
                Some("legacy".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryDeviceStore::seeded(vec![DeviceRecord::new(
            DeviceKind::Actuator,
            "A",
            Utc::now(),
        )]);

        let patch = RecordPatch {
            state: Some(state::OPEN.to_string()),
            ..Default::default()
        };
        let updated = store.update("1", &patch).await.unwrap();
        assert_eq!(updated.state, state::OPEN);

        assert!(matches!(
            store.update("99", &patch).await,
            Err(DomainError::Remote { status: Some(404), .. })
        ));

        store.delete("1").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.delete("1").await.is_err());
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_operation() {
        let store = InMemoryDeviceStore::with_demo_fleet();
        store.set_offline(true);

        assert!(store.list().await.is_err());
        assert!(
            store
                .create(&DeviceRecord::new(DeviceKind::Door, "A", Utc::now()))
                .await
                .is_err()
        );
        assert!(store.delete("1").await.is_err());

        store.set_offline(false);
        assert_eq!(store.list().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_create_budget() {
        let store = InMemoryDeviceStore::new();
        store.fail_creates_after(1);
        let record = DeviceRecord::new(DeviceKind::Door, "A", Utc::now());

        assert!(store.create(&record).await.is_ok());
        assert!(store.create(&record).await.is_err());
        assert_eq!(store.records().await.len(), 1);
    }
}
