//! The local mirror of the server's record collection.
//!
//! ## Ordering
//!
//! Mutations on the same record id run one at a time, in the order they were
//! issued: each takes a per-record async lock, reads the currently known
//! value, sends its request and merges the response before releasing. A second
//! toggle therefore sees the first toggle's merged result instead of racing it.
//! Mutations on different ids, and creates, run concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{ClientError, Record, RecordUpdate, RecordsApi};

/// Lifecycle of the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    /// A fetch was issued and has not succeeded yet. A failed fetch stays here.
    Loading,
    Loaded,
}

#[derive(Debug)]
struct Mirror {
    state: LoadState,
    records: Vec<Record>,
}

/// Client-held copy of the record collection, reconciled against server responses.
pub struct SyncedRecords<A> {
    api: A,
    mirror: Mutex<Mirror>,
    record_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<A: RecordsApi> SyncedRecords<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            mirror: Mutex::new(Mirror {
                state: LoadState::Unloaded,
                records: Vec::new(),
            }),
            record_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> LoadState {
        self.mirror().state
    }

    /// Snapshot of the local collection, newest-created first.
    pub fn records(&self) -> Vec<Record> {
        self.mirror().records.clone()
    }

    pub fn get(&self, id: &str) -> Option<Record> {
        self.mirror().records.iter().find(|r| r.id == id).cloned()
    }

    /// Initial fetch: `Unloaded -> Loading -> Loaded`.
    ///
    /// On success the fetched collection replaces local state. On failure the
    /// error is logged and returned, and the mirror stays `Loading`; there is
    /// no automatic retry.
    pub async fn load(&self) -> Result<(), ClientError> {
        self.mirror().state = LoadState::Loading;
        self.fetch_all().await
    }

    /// Explicit reload. Unlike [`load`](Self::load), a failure leaves the
    /// current state and records untouched.
    pub async fn refetch(&self) -> Result<(), ClientError> {
        self.fetch_all().await
    }

    /// Create a record and prepend the server's copy, with its assigned id.
    pub async fn create(&self, name: &str) -> Result<Record, ClientError> {
        let record = self.api.create(name).await.inspect_err(log_failure)?;

        self.mirror().records.insert(0, record.clone());
        tracing::debug!(id = %record.id, "Merged created record");
        Ok(record)
    }

    /// Delete a record; it is removed locally only once the server confirms.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let lock = self.record_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.delete_locked(id).await
        };
        self.release_lock(id, lock);
        result
    }

    /// Flip `completed`. Only that field is merged, with the server's value.
    pub async fn toggle(&self, id: &str) -> Result<Record, ClientError> {
        let lock = self.record_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.toggle_locked(id).await
        };
        self.release_lock(id, lock);
        result
    }

    /// Bump `popularity` by one. Only that field is merged, with the server's value.
    ///
    /// A record already at the largest representable popularity is refused
    /// without contacting the server.
    pub async fn like(&self, id: &str) -> Result<Record, ClientError> {
        let lock = self.record_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.like_locked(id).await
        };
        self.release_lock(id, lock);
        result
    }

    async fn delete_locked(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete(id).await.inspect_err(log_failure)?;

        self.mirror().records.retain(|r| r.id != id);
        tracing::debug!(id, "Merged deletion");
        Ok(())
    }

    async fn toggle_locked(&self, id: &str) -> Result<Record, ClientError> {
        let current = self.known(id)?;
        let update = RecordUpdate {
            completed: Some(!current.completed),
            ..Default::default()
        };
        let returned = self.api.update(id, &update).await.inspect_err(log_failure)?;

        let completed = returned.completed;
        Ok(self
            .merge(id, |local| local.completed = completed)
            .unwrap_or(returned))
    }

    async fn like_locked(&self, id: &str) -> Result<Record, ClientError> {
        let current = self.known(id)?;
        let popularity = current.popularity.checked_add(1).ok_or_else(|| {
            ClientError::Validation(format!("popularity of {} cannot grow further", id))
        })?;
        let update = RecordUpdate {
            popularity: Some(popularity),
            ..Default::default()
        };
        let returned = self.api.update(id, &update).await.inspect_err(log_failure)?;

        let popularity = returned.popularity;
        Ok(self
            .merge(id, |local| local.popularity = popularity)
            .unwrap_or(returned))
    }

    async fn fetch_all(&self) -> Result<(), ClientError> {
        let records = self.api.list().await.inspect_err(log_failure)?;

        let mut mirror = self.mirror();
        tracing::debug!(count = records.len(), "Loaded records");
        mirror.records = records;
        mirror.state = LoadState::Loaded;
        Ok(())
    }

    fn known(&self, id: &str) -> Result<Record, ClientError> {
        self.get(id)
            .ok_or_else(|| ClientError::UnknownRecord(id.to_string()))
    }

    /// Apply `apply` to the local copy of `id` and return the result.
    ///
    /// `None` if the record was dropped locally in the meantime (e.g. by a
    /// refetch that no longer contains it); nothing is reinserted.
    fn merge(&self, id: &str, apply: impl FnOnce(&mut Record)) -> Option<Record> {
        let mut mirror = self.mirror();
        let local = mirror.records.iter_mut().find(|r| r.id == id)?;
        apply(local);
        Some(local.clone())
    }

    fn record_lock(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.record_locks
            .lock()
            .expect("Record lock table poisoned")
            .entry(id.to_string())
            .or_default()
            .clone()
    }

    /// Drop the table entry for `id` once no other mutation holds or awaits it.
    fn release_lock(&self, id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .record_locks
            .lock()
            .expect("Record lock table poisoned");
        // One reference in the table, one held here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(id);
        }
    }

    fn mirror(&self) -> std::sync::MutexGuard<'_, Mirror> {
        self.mirror.lock().expect("Mirror lock poisoned")
    }
}

fn log_failure(err: &ClientError) {
    if err.is_transport() {
        tracing::warn!(error = %err, "Request did not complete");
    } else {
        tracing::warn!(error = %err, "Request rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct OneRecord {
        record: Mutex<Record>,
    }

    #[async_trait]
    impl RecordsApi for OneRecord {
        async fn list(&self) -> Result<Vec<Record>, ClientError> {
            Ok(vec![self.record.lock().unwrap().clone()])
        }

        async fn create(&self, _name: &str) -> Result<Record, ClientError> {
            Err(ClientError::Validation("read-only".to_string()))
        }

        async fn update(&self, _id: &str, update: &RecordUpdate) -> Result<Record, ClientError> {
            let mut record = self.record.lock().unwrap();
            if let Some(completed) = update.completed {
                record.completed = completed;
            }
            if let Some(popularity) = update.popularity {
                record.popularity = popularity;
            }
            Ok(record.clone())
        }

        async fn delete(&self, _id: &str) -> Result<(), ClientError> {
            Ok(())
        }
    }

    fn synced() -> SyncedRecords<OneRecord> {
        SyncedRecords::new(OneRecord {
            record: Mutex::new(Record {
                id: "rec-0".to_string(),
                name: "Holi".to_string(),
                popularity: 0,
                completed: false,
            }),
        })
    }

    fn lock_entries<A: RecordsApi>(synced: &SyncedRecords<A>) -> usize {
        synced.record_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_lock_entries_released_after_mutations() {
        let synced = synced();
        synced.load().await.unwrap();

        synced.toggle("rec-0").await.unwrap();
        synced.like("rec-0").await.unwrap();
        assert_eq!(lock_entries(&synced), 0);

        let (a, b) = tokio::join!(synced.toggle("rec-0"), synced.like("rec-0"));
        a.unwrap();
        b.unwrap();
        assert_eq!(lock_entries(&synced), 0);
    }

    #[tokio::test]
    async fn test_lock_entry_released_after_failure() {
        let synced = synced();
        synced.load().await.unwrap();

        assert!(synced.toggle("missing").await.is_err());
        assert_eq!(lock_entries(&synced), 0);
    }
}
