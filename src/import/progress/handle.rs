use crate::import::types::ImportProgress;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::trace;

type SubscriptionId = u64;

/// Filter criteria for progress subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFilter {
    All,
    /// Only row failures and the final summary
    Failures,
}

impl SubscriptionFilter {
    fn matches(&self, progress: &ImportProgress) -> bool {
        match self {
            SubscriptionFilter::All => true,
            SubscriptionFilter::Failures => matches!(
                progress,
                ImportProgress::RowFailed { .. } | ImportProgress::Complete { .. }
            ),
        }
    }
}

struct Subscription {
    filter: SubscriptionFilter,
    tx: tokio_mpsc::UnboundedSender<ImportProgress>,
}

/// Handle for subscribing to import progress updates
#[derive(Clone, Default)]
pub struct ImportProgressHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl ImportProgressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to progress updates matching `filter`.
    /// Subscription is automatically removed when receiver is dropped
    pub fn subscribe(
        &self,
        filter: SubscriptionFilter,
    ) -> tokio_mpsc::UnboundedReceiver<ImportProgress> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        self.subscriptions
            .lock()
            .unwrap()
            .insert(id, Subscription { filter, tx });
        rx
    }

    /// Dispatch an update to all matching subscribers
    pub fn publish(&self, progress: ImportProgress) {
        trace!("Import progress: {:?}", progress);

        let mut subs = self.subscriptions.lock().unwrap();
        let mut to_remove = Vec::new();

        for (id, subscription) in subs.iter() {
            if subscription.filter.matches(&progress) {
                // If send fails, receiver was dropped - mark for removal
                if subscription.tx.send(progress.clone()).is_err() {
                    to_remove.push(*id);
                }
            }
        }

        // Clean up dropped subscriptions
        for id in to_remove {
            subs.remove(&id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }
}
