use super::ImportProgressHandle;
use crate::import::types::ImportProgress;
use crate::record::RecordId;

/// Counts settled rows during an approval and emits progress events.
///
/// A row is settled once its create call returned, successfully or not.
pub struct CommitProgressTracker {
    handle: ImportProgressHandle,
    total: usize,
    settled: usize,
    created: usize,
    failed: usize,
}

impl CommitProgressTracker {
    /// Start tracking; emits `Started`
    pub fn start(handle: ImportProgressHandle, total: usize) -> Self {
        handle.publish(ImportProgress::Started { total });
        Self {
            handle,
            total,
            settled: 0,
            created: 0,
            failed: 0,
        }
    }

    pub fn on_row_committed(&mut self, row: usize, id: RecordId) {
        self.settled += 1;
        self.created += 1;
        self.handle.publish(ImportProgress::RowCommitted {
            row,
            id,
            percent: calculate_progress(self.settled, self.total),
        });
    }

    pub fn on_row_failed(&mut self, row: usize, error: String) {
        self.settled += 1;
        self.failed += 1;
        self.handle.publish(ImportProgress::RowFailed {
            row,
            error,
            percent: calculate_progress(self.settled, self.total),
        });
    }

    /// Emit `Complete` with the final counts
    pub fn finish(self) {
        self.handle.publish(ImportProgress::Complete {
            created: self.created,
            failed: self.failed,
        });
    }
}

/// Calculate progress percentage
fn calculate_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        100
    } else {
        ((completed as f64 / total as f64) * 100.0).min(100.0) as u8
    }
}
