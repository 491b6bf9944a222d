// # Import Module
//
// Spreadsheet import with an explicit preview step:
//
// - **spreadsheet**: Reads the first sheet of a workbook into staged rows
// - **BulkImportPipeline**: Holds the preview, commits it on approval
// - **progress**: Per-row commit progress for subscribers
//
// Public API:
// - `BulkImportPipeline`: parse / stage / preview / discard / approve
// - `ImportReport`: Per-row outcome of an approval
// - `ImportProgress`: Progress updates while committing

mod pipeline;
mod progress;
mod spreadsheet;
mod types;

pub use pipeline::BulkImportPipeline;
pub use progress::{CommitProgressTracker, ImportProgressHandle, SubscriptionFilter};
pub use spreadsheet::{parse_staged, read_rows};
pub use types::{
    ImportError, ImportProgress, ImportReport, ImportState, RowOutcome, RowResult, Slot,
    StagedRecord,
};
