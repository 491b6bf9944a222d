// # Record Store
//
// Typed CRUD and query operations over the named collections of the
// document store. All writes are whole-record replacements.
//
// - `RecordStore`: backend trait
// - `MemoryRecordStore`: in-process store (offline use, tests)
// - `SqliteRecordStore`: JSON documents in a SQLite table

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::record::{Collection, FieldValue, Fields, Record, RecordId};
use std::sync::Arc;
use thiserror::Error;

/// Upper sentinel of the prefix range: a private-use code point that sorts
/// after every character an operator would type.
pub const MAX_CHAR: char = '\u{f8ff}';

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: Collection, id: RecordId },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Field {field} holds a non-finite number")]
    NonFiniteNumber { field: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reject fields that cannot round-trip through a JSON document.
///
/// serde_json writes NaN and infinities as `null`, which no `FieldValue`
/// reads back.
pub fn ensure_storable(fields: &Fields) -> Result<(), StoreError> {
    match fields
        .iter()
        .find(|(_, value)| matches!(value, FieldValue::Number(n) if !n.is_finite()))
    {
        Some((field, _)) => Err(StoreError::NonFiniteNumber {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

/// Predicate of a collection query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordQuery {
    All,
    /// Records whose lower-cased `field` lies in `[lower, upper)`, where
    /// `upper` is `lower + MAX_CHAR`.
    ///
    /// This approximates "starts with"; it is not a substring search.
    /// Case folding of non-ASCII text follows `str::to_lowercase` and may
    /// not match what an operator expects.
    PrefixRange {
        field: String,
        lower: String,
        upper: String,
    },
}

impl RecordQuery {
    /// Prefix query on `field`, or every record when `text` is empty
    pub fn prefix(field: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return RecordQuery::All;
        }
        let lower = text.to_lowercase();
        let upper = format!("{}{}", lower, MAX_CHAR);
        RecordQuery::PrefixRange {
            field: field.into(),
            lower,
            upper,
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            RecordQuery::All => true,
            RecordQuery::PrefixRange {
                field,
                lower,
                upper,
            } => match fields.get(field) {
                Some(FieldValue::Text(value)) => {
                    let value = value.to_lowercase();
                    value >= *lower && value < *upper
                }
                // Records without a text value in the field never match a range
                _ => false,
            },
        }
    }
}

/// Trait for document store operations (allows mocking for tests)
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new document, returning its store-assigned identifier
    async fn create(&self, collection: Collection, fields: &Fields)
        -> Result<RecordId, StoreError>;

    /// Replace every field of an existing document
    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        fields: &Fields,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), StoreError>;

    /// Matching documents in insertion order
    async fn query(
        &self,
        collection: Collection,
        query: &RecordQuery,
    ) -> Result<Vec<Record>, StoreError>;

    async fn get(&self, collection: Collection, id: &RecordId)
        -> Result<Option<Record>, StoreError>;
}

pub type SharedRecordStore = Arc<dyn RecordStore>;
