use super::{ensure_storable, RecordQuery, RecordStore, StoreError};
use crate::record::{Collection, Fields, Record, RecordId};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::trace;

/// In-process record store.
///
/// Keeps documents in insertion order per collection. Used for offline
/// runs and as the reference store in tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    collections: Mutex<HashMap<Collection, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with existing documents
    pub fn with_records(collection: Collection, records: Vec<Record>) -> Self {
        let store = Self::default();
        store
            .collections
            .lock()
            .unwrap()
            .insert(collection, records);
        store
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(&collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(
        &self,
        collection: Collection,
        fields: &Fields,
    ) -> Result<RecordId, StoreError> {
        ensure_storable(fields)?;
        let id = RecordId::new(uuid::Uuid::new_v4().to_string());
        self.collections
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .push(Record::new(id.clone(), fields.clone()));
        trace!("MemoryRecordStore: created {}/{}", collection, id);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        fields: &Fields,
    ) -> Result<(), StoreError> {
        ensure_storable(fields)?;
        let mut collections = self.collections.lock().unwrap();
        let record = collections
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.clone(),
            })?;
        record.fields = fields.clone();
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), StoreError> {
        if let Some(records) = self.collections.lock().unwrap().get_mut(&collection) {
            records.retain(|r| &r.id != id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        query: &RecordQuery,
    ) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| query.matches(&r.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&collection)
            .and_then(|records| records.iter().find(|r| &r.id == id).cloned()))
    }
}
