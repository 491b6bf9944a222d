// # Upload Coordinator
//
// Tracks at most one active upload per form field and binds the resulting
// URL into the form draft that will be written as a record.
//
// Per field: Idle -> Uploading -> Succeeded(url) | Failed(reason)
//
// Uploads run as detached tasks: once started they always land in the
// asset store, even if the form is closed before they finish. Within one
// field the most recently started task wins; a late completion from a
// replaced task is reported as `Superseded` and never touches the draft.

use crate::asset_store::{AssetNamespace, AssetStoreError, AssetStoreManager};
use crate::record::{FieldValue, Fields};
use crate::validation::{validate_image, UploadFile, ValidationError};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Identity of one started upload, unique per coordinator
pub type TaskId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Uploading { task: TaskId },
    Succeeded { task: TaskId, url: String },
    Failed { task: TaskId, reason: String },
}

/// Discrete upload notifications published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Started {
        field: String,
        task: TaskId,
        bytes: usize,
    },
    Succeeded {
        field: String,
        task: TaskId,
        url: String,
    },
    Failed {
        field: String,
        task: TaskId,
        reason: String,
    },
    /// A replaced task finished; its result was dropped
    Superseded { field: String, task: TaskId },
}

/// Result of a detached upload task
struct Completion {
    field: String,
    task: TaskId,
    result: Result<String, AssetStoreError>,
}

pub struct UploadCoordinator {
    assets: AssetStoreManager,
    draft: Fields,
    fields: HashMap<String, UploadState>,
    next_task: TaskId,
    in_flight: usize,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    subscribers: Vec<mpsc::UnboundedSender<UploadEvent>>,
}

impl UploadCoordinator {
    /// Coordinator for a blank form
    pub fn new(assets: AssetStoreManager) -> Self {
        Self::for_draft(assets, Fields::new())
    }

    /// Coordinator for a form pre-filled with an existing record's fields.
    /// Fields with no new upload keep their current value.
    pub fn for_draft(assets: AssetStoreManager, draft: Fields) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        UploadCoordinator {
            assets,
            draft,
            fields: HashMap::new(),
            next_task: 1,
            in_flight: 0,
            completions_tx,
            completions_rx,
            subscribers: Vec::new(),
        }
    }

    /// Receive every upload event from now on.
    /// The subscription ends when the receiver is dropped.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<UploadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: &UploadEvent) {
        // If send fails, receiver was dropped
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn state(&self, field: &str) -> UploadState {
        self.fields.get(field).cloned().unwrap_or(UploadState::Idle)
    }

    /// Whether any field still waits on its current upload
    pub fn is_uploading(&self) -> bool {
        self.fields
            .values()
            .any(|s| matches!(s, UploadState::Uploading { .. }))
    }

    pub fn draft(&self) -> &Fields {
        &self.draft
    }

    /// Set a plain (non-upload) form input
    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.draft.insert(field.into(), value.into());
    }

    pub fn into_draft(self) -> Fields {
        self.draft
    }

    /// Start uploading `file` for `field`.
    ///
    /// The file is checked first; a rejected file leaves the field state and
    /// the draft untouched and never reaches the asset store. Starting a new
    /// upload on a field replaces the binding of any upload still running.
    pub fn start(
        &mut self,
        field: &str,
        namespace: AssetNamespace,
        file: UploadFile,
    ) -> Result<TaskId, ValidationError> {
        validate_image(&file)?;

        let task = self.next_task;
        self.next_task += 1;

        if let Some(UploadState::Uploading { task: previous }) = self.fields.get(field) {
            debug!("Field '{}': task {} replaces task {}", field, task, previous);
        }
        self.fields
            .insert(field.to_string(), UploadState::Uploading { task });
        self.in_flight += 1;

        let event = UploadEvent::Started {
            field: field.to_string(),
            task,
            bytes: file.size(),
        };
        self.publish(&event);

        let assets = self.assets.clone();
        let tx = self.completions_tx.clone();
        let field = field.to_string();
        tokio::spawn(async move {
            let result = assets.upload(namespace, &file).await;
            // Coordinator may be gone; the blob is stored either way
            let _ = tx.send(Completion {
                field,
                task,
                result,
            });
        });

        Ok(task)
    }

    /// Wait for the next upload to finish and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.completions_rx.recv().await?;
        self.in_flight -= 1;

        let event = self.settle(completion);
        self.publish(&event);
        Some(event)
    }

    /// Drive uploads until every field has settled, returning the events seen
    pub async fn wait_idle(&mut self) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while self.is_uploading() {
            match self.next_event().await {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }

    fn settle(&mut self, completion: Completion) -> UploadEvent {
        let Completion {
            field,
            task,
            result,
        } = completion;

        let current = matches!(
            self.fields.get(&field),
            Some(UploadState::Uploading { task: active }) if *active == task
        );
        if !current {
            debug!("Field '{}': dropping result of replaced task {}", field, task);
            return UploadEvent::Superseded { field, task };
        }

        match result {
            Ok(url) => {
                info!("Field '{}' bound to {}", field, url);
                self.draft
                    .insert(field.clone(), FieldValue::Text(url.clone()));
                self.fields.insert(
                    field.clone(),
                    UploadState::Succeeded {
                        task,
                        url: url.clone(),
                    },
                );
                UploadEvent::Succeeded { field, task, url }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Upload for field '{}' failed: {}", field, reason);
                self.fields.insert(
                    field.clone(),
                    UploadState::Failed {
                        task,
                        reason: reason.clone(),
                    },
                );
                UploadEvent::Failed {
                    field,
                    task,
                    reason,
                }
            }
        }
    }
}
