use crate::listing::ListingError;
use crate::record::{FieldValue, Fields, RecordId, RecordSchema};
use crate::record_store::StoreError;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("Import is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),
}

/// One cell of a staged row: a value, or explicitly nothing.
///
/// `Absent` is distinct from an empty string: absent fields are left out of
/// the written document, empty strings are written as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(FieldValue),
    Absent,
}

/// A parsed row awaiting approval. Never mixed with committed records.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    /// Client-side key for list display only; never written to the store
    pub temp_key: String,
    /// 1-based position in the preview (header and blank rows excluded)
    pub row: usize,
    pub slots: BTreeMap<String, Slot>,
}

impl StagedRecord {
    pub fn new(row: usize) -> Self {
        StagedRecord {
            temp_key: uuid::Uuid::new_v4().to_string(),
            row,
            slots: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.slots
            .insert(field.to_string(), Slot::Value(value.into()));
        self
    }

    pub fn without(mut self, field: &str) -> Self {
        self.slots.insert(field.to_string(), Slot::Absent);
        self
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        match self.slots.get(field) {
            Some(Slot::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Give every schema column the kind's empty value when the row left it
    /// out. Missing columns never reject a row.
    pub fn default_fill(&mut self, schema: &RecordSchema) {
        for spec in schema.fields {
            let slot = self
                .slots
                .entry(spec.name.to_string())
                .or_insert(Slot::Absent);
            if *slot == Slot::Absent {
                *slot = Slot::Value(spec.kind.default_value());
            }
        }
    }

    /// Fields to send to `create`: absent slots dropped, identifier column
    /// dropped so every staged row becomes a new document.
    pub fn to_create_fields(&self, schema: &RecordSchema) -> Fields {
        self.slots
            .iter()
            .filter(|(name, _)| name.as_str() != schema.id_field)
            .filter_map(|(name, slot)| match slot {
                Slot::Value(value) => Some((name.clone(), value.clone())),
                Slot::Absent => None,
            })
            .collect()
    }
}

/// Pipeline phase
#[derive(Debug, Clone, PartialEq)]
pub enum ImportState {
    Empty,
    Parsed(Vec<StagedRecord>),
    Committing { total: usize },
    Committed(ImportReport),
}

impl ImportState {
    pub fn name(&self) -> &'static str {
        match self {
            ImportState::Empty => "empty",
            ImportState::Parsed(_) => "parsed",
            ImportState::Committing { .. } => "committing",
            ImportState::Committed(_) => "committed",
        }
    }
}

/// What happened to one staged row on approval
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Created { id: RecordId },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowResult {
    pub row: usize,
    pub temp_key: String,
    pub outcome: RowOutcome,
}

/// Per-row result of an approval. Rows are attempted independently, so a
/// report can mix created and failed rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportReport {
    pub rows: Vec<RowResult>,
    /// Set when the listing could not be reloaded after the commit
    pub refresh_error: Option<String>,
}

impl ImportReport {
    pub fn created(&self) -> impl Iterator<Item = &RecordId> {
        self.rows.iter().filter_map(|r| match &r.outcome {
            RowOutcome::Created { id } => Some(id),
            RowOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &RowResult> {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Failed { .. }))
    }

    pub fn created_count(&self) -> usize {
        self.created().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Progress updates during approval
#[derive(Debug, Clone, PartialEq)]
pub enum ImportProgress {
    Started {
        total: usize,
    },
    RowCommitted {
        row: usize,
        id: RecordId,
        percent: u8,
    },
    RowFailed {
        row: usize,
        error: String,
        percent: u8,
    },
    Complete {
        created: usize,
        failed: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::COMMENT_SCHEMA;

    #[test]
    fn test_default_fill_only_fills_gaps() {
        let mut staged = StagedRecord::new(1)
            .with("name", "Anna")
            .without("avatar");
        staged.default_fill(&COMMENT_SCHEMA);

        assert_eq!(staged.value("name"), Some(&FieldValue::text("Anna")));
        assert_eq!(staged.value("avatar"), Some(&FieldValue::text("")));
        assert_eq!(staged.value("rating"), Some(&FieldValue::Number(0.0)));
        assert_eq!(staged.value("key"), Some(&FieldValue::text("")));
    }

    #[test]
    fn test_create_fields_drop_absent_and_identifier() {
        let staged = StagedRecord::new(2)
            .with("key", "old-id")
            .with("name", "Bob")
            .with("comment", "")
            .without("avatar");

        let fields = staged.to_create_fields(&COMMENT_SCHEMA);
        assert!(!fields.contains_key("key"));
        assert!(!fields.contains_key("avatar"));
        // Empty strings are kept
        assert_eq!(fields.get("comment"), Some(&FieldValue::text("")));
        assert_eq!(fields.len(), 2);
    }
}
