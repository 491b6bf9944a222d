// # Bulk Import Pipeline
//
// Empty -> Parsed(staged) -> Committing -> Committed(report)
//
// Parsing a spreadsheet stages rows for preview only; nothing reaches the
// record store until `approve`. Staged rows are kept apart from the
// listing's committed rows, so a preview never shows up as real data.
//
// Approval writes each staged row as a new document. Rows are attempted
// independently: a failing row is recorded in the report and the rest
// still go through. After the batch the listing is reloaded from the store.

use crate::import::progress::{CommitProgressTracker, ImportProgressHandle, SubscriptionFilter};
use crate::import::spreadsheet;
use crate::import::types::{
    ImportError, ImportProgress, ImportReport, ImportState, RowOutcome, RowResult, StagedRecord,
};
use crate::listing::ListingController;
use crate::record::RecordSchema;
use crate::record_store::SharedRecordStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct BulkImportPipeline {
    store: SharedRecordStore,
    schema: &'static RecordSchema,
    state: ImportState,
    progress: ImportProgressHandle,
}

impl BulkImportPipeline {
    pub fn new(store: SharedRecordStore, schema: &'static RecordSchema) -> Self {
        BulkImportPipeline {
            store,
            schema,
            state: ImportState::Empty,
            progress: ImportProgressHandle::new(),
        }
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    /// Progress events for the next approvals
    pub fn subscribe(&self, filter: SubscriptionFilter) -> mpsc::UnboundedReceiver<ImportProgress> {
        self.progress.subscribe(filter)
    }

    /// Parse a workbook and stage its rows, replacing any previous preview.
    ///
    /// A workbook that cannot be read leaves the current state as it was.
    pub fn parse(&mut self, bytes: &[u8]) -> Result<&[StagedRecord], ImportError> {
        self.ensure_not_committing()?;
        let staged = spreadsheet::parse_staged(self.schema, bytes)?;
        info!(
            "Staged {} {} rows for preview",
            staged.len(),
            self.schema.collection
        );
        self.state = ImportState::Parsed(staged);
        Ok(self.preview())
    }

    /// Stage already-built rows, replacing any previous preview
    pub fn stage(&mut self, staged: Vec<StagedRecord>) -> Result<(), ImportError> {
        self.ensure_not_committing()?;
        self.state = ImportState::Parsed(staged);
        Ok(())
    }

    /// Rows awaiting approval; empty outside the `Parsed` state
    pub fn preview(&self) -> &[StagedRecord] {
        match &self.state {
            ImportState::Parsed(staged) => staged,
            _ => &[],
        }
    }

    /// Drop the preview without writing anything
    pub fn discard(&mut self) -> Result<(), ImportError> {
        self.ensure_not_committing()?;
        if let ImportState::Parsed(staged) = &self.state {
            debug!("Discarding {} staged rows", staged.len());
        }
        self.state = ImportState::Empty;
        Ok(())
    }

    /// Write every staged row to the store, then reload `listing`.
    ///
    /// Only valid in the `Parsed` state. Per-row failures are reported, not
    /// returned as an error; a failed reload is recorded in the report.
    pub async fn approve(
        &mut self,
        listing: &mut ListingController,
    ) -> Result<ImportReport, ImportError> {
        let staged = match std::mem::replace(&mut self.state, ImportState::Empty) {
            ImportState::Parsed(staged) => staged,
            other => {
                let actual = other.name();
                self.state = other;
                return Err(ImportError::InvalidState {
                    expected: "parsed",
                    actual,
                });
            }
        };

        let total = staged.len();
        let collection = self.schema.collection;
        info!("Committing {} staged rows to {}", total, collection);
        self.state = ImportState::Committing { total };

        // Field borrows so the guard can hold the state while rows are written
        let store = &self.store;
        let schema = self.schema;
        let mut commit = CommitGuard {
            state: &mut self.state,
            report: ImportReport::default(),
            total,
        };
        let mut tracker = CommitProgressTracker::start(self.progress.clone(), total);

        for record in staged {
            let fields = record.to_create_fields(schema);
            let outcome = match store.create(collection, &fields).await {
                Ok(id) => {
                    tracker.on_row_committed(record.row, id.clone());
                    RowOutcome::Created { id }
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!("Row {} of import failed: {}", record.row, error);
                    tracker.on_row_failed(record.row, error.clone());
                    RowOutcome::Failed { error }
                }
            };
            commit.report.rows.push(RowResult {
                row: record.row,
                temp_key: record.temp_key,
                outcome,
            });
        }
        tracker.finish();

        if let Err(e) = listing.refresh().await {
            warn!("Listing reload after import failed: {}", e);
            commit.report.refresh_error = Some(e.to_string());
        }

        let report = commit.finish();
        info!(
            "Import into {} done: {} created, {} failed",
            collection,
            report.created_count(),
            report.failed_count()
        );
        Ok(report)
    }

    fn ensure_not_committing(&self) -> Result<(), ImportError> {
        match self.state {
            ImportState::Committing { .. } => Err(ImportError::InvalidState {
                expected: "idle",
                actual: self.state.name(),
            }),
            _ => Ok(()),
        }
    }
}

/// Moves the pipeline out of `Committing` even when `approve` is dropped
/// mid-batch. An interrupted commit ends as `Committed` with the rows
/// attempted so far.
struct CommitGuard<'a> {
    state: &'a mut ImportState,
    report: ImportReport,
    total: usize,
}

impl CommitGuard<'_> {
    fn finish(mut self) -> ImportReport {
        let report = std::mem::take(&mut self.report);
        *self.state = ImportState::Committed(report.clone());
        report
    }
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        if matches!(self.state, ImportState::Committing { .. }) {
            warn!(
                "Import interrupted after {} of {} rows",
                self.report.rows.len(),
                self.total
            );
            *self.state = ImportState::Committed(std::mem::take(&mut self.report));
        }
    }
}
