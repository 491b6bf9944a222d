use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tourdesk::record::{Collection, FieldValue, Fields, Record, RecordId};
use tourdesk::record_store::{MemoryRecordStore, RecordQuery, RecordStore, StoreError};

/// Wraps a `MemoryRecordStore`, counting calls and failing on demand
#[derive(Default)]
pub struct FlakyRecordStore {
    inner: MemoryRecordStore,
    fail_queries: AtomicBool,
    fail_writes: AtomicBool,
    /// `create` fails for documents whose `name` is listed here
    fail_names: Mutex<Vec<String>>,
    create_delay: Mutex<Option<Duration>>,
    queries: AtomicUsize,
    creates: AtomicUsize,
    deletes: AtomicUsize,
}

impl FlakyRecordStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_records(collection: Collection, records: Vec<Record>) -> Arc<Self> {
        Arc::new(FlakyRecordStore {
            inner: MemoryRecordStore::with_records(collection, records),
            ..Default::default()
        })
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_named(&self, name: &str) {
        self.fail_names.lock().unwrap().push(name.to_string());
    }

    /// Every `create` sleeps this long before writing
    pub fn delay_creates(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.inner.len(collection)
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for FlakyRecordStore {
    async fn create(
        &self,
        collection: Collection,
        fields: &Fields,
    ) -> Result<RecordId, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_writes()?;
        if let Some(FieldValue::Text(name)) = fields.get("name") {
            if self.fail_names.lock().unwrap().contains(name) {
                return Err(StoreError::Unavailable(format!("rejected {}", name)));
            }
        }
        self.inner.create(collection, fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        fields: &Fields,
    ) -> Result<(), StoreError> {
        self.check_writes()?;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;
        self.inner.delete(collection, id).await
    }

    async fn query(
        &self,
        collection: Collection,
        query: &RecordQuery,
    ) -> Result<Vec<Record>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected query failure".to_string()));
        }
        self.inner.query(collection, query).await
    }

    async fn get(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        self.inner.get(collection, id).await
    }
}
