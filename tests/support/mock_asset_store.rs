use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tourdesk::asset_store::{AssetStore, AssetStoreError};

/// In-memory asset store that counts calls and can hold or fail uploads.
///
/// A held key blocks its `put_object` until `release` is called, which lets
/// tests decide the order in which concurrent uploads finish.
#[derive(Default)]
pub struct MockAssetStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_puts: AtomicBool,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MockAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload fails after reaching the store
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_puts.store(true, Ordering::SeqCst);
        store
    }

    pub fn hold(&self, key: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(key) {
            gate.notify_one();
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn url(key: &str) -> String {
        format!("mock://{}", key)
    }
}

#[async_trait::async_trait]
impl AssetStore for MockAssetStore {
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String, AssetStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AssetStoreError::Upload(format!("injected failure for {}", key)));
        }

        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(Self::url(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AssetStoreError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| Self::url(key))
            .collect())
    }
}
