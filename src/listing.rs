// # Listing Controller
//
// Searchable, paginated view over one collection. Owns the `committed`
// rows shown to the operator; nothing else writes them.
//
// The whole matching set is fetched per search and paged client-side, so
// page and page size changes never go back to the store.

use crate::record::{Fields, Record, RecordId, RecordSchema};
use crate::record_store::{RecordQuery, SharedRecordStore, StoreError};
use crate::validation::ValidationError;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Search text plus paging position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub search_text: String,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        ListingQuery {
            search_text: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of the listing, computed from `(committed, query)`
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub rows: &'a [Record],
    pub page: usize,
    pub page_size: usize,
    /// Number of matching records (all pages)
    pub total: usize,
}

impl Page<'_> {
    /// 1-based running number of a row across pages
    pub fn row_number(&self, index: usize) -> usize {
        (self.page - 1) * self.page_size + index + 1
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }
}

pub struct ListingController {
    store: SharedRecordStore,
    schema: &'static RecordSchema,
    committed: Vec<Record>,
    query: ListingQuery,
}

impl ListingController {
    pub fn new(store: SharedRecordStore, schema: &'static RecordSchema) -> Self {
        ListingController {
            store,
            schema,
            committed: Vec::new(),
            query: ListingQuery::default(),
        }
    }

    /// Start with a custom page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.query.page_size = page_size.max(1);
        self
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn committed(&self) -> &[Record] {
        &self.committed
    }

    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    pub fn total(&self) -> usize {
        self.committed.len()
    }

    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.committed.iter().find(|r| &r.id == id)
    }

    fn store_query(&self) -> RecordQuery {
        RecordQuery::prefix(self.schema.search_field, self.query.search_text.clone())
    }

    /// Re-run the current search and replace `committed` wholesale.
    ///
    /// On failure the previous rows are kept and the error is returned.
    pub async fn refresh(&mut self) -> Result<(), ListingError> {
        let collection = self.schema.collection;
        match self.store.query(collection, &self.store_query()).await {
            Ok(records) => {
                debug!(
                    "Refreshed {} with '{}': {} records",
                    collection,
                    self.query.search_text,
                    records.len()
                );
                self.committed = records;
                self.clamp_page();
                Ok(())
            }
            Err(e) => {
                warn!("Refresh of {} failed, keeping last rows: {}", collection, e);
                Err(e.into())
            }
        }
    }

    /// Change the search text and fetch the new matching set.
    ///
    /// Paging goes back to the first page.
    pub async fn set_search(&mut self, text: impl Into<String>) -> Result<(), ListingError> {
        self.query.search_text = text.into();
        self.query.page = 1;
        self.refresh().await
    }

    pub fn set_page(&mut self, page: usize) -> Result<(), ValidationError> {
        if page == 0 {
            return Err(ValidationError::InvalidPage);
        }
        self.query.page = page;
        Ok(())
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        self.query.page_size = page_size;
        self.clamp_page();
        Ok(())
    }

    fn clamp_page(&mut self) {
        let last = self.committed.len().div_ceil(self.query.page_size).max(1);
        if self.query.page > last {
            self.query.page = last;
        }
    }

    /// Rows of the current page
    pub fn page(&self) -> Page<'_> {
        let start = (self.query.page - 1)
            .saturating_mul(self.query.page_size)
            .min(self.committed.len());
        let end = (start + self.query.page_size).min(self.committed.len());

        Page {
            rows: &self.committed[start..end],
            page: self.query.page,
            page_size: self.query.page_size,
            total: self.committed.len(),
        }
    }

    /// Create a record and append it locally without a refresh
    pub async fn add(&mut self, fields: Fields) -> Result<RecordId, ListingError> {
        self.schema.validate(&fields)?;
        let fields = self.schema.strip_id(fields);

        let id = self.store.create(self.schema.collection, &fields).await?;
        info!("Added {}/{}", self.schema.collection, id);

        // A refresh may already have brought the row in
        match self.committed.iter_mut().find(|r| r.id == id) {
            Some(existing) => existing.fields = fields,
            None => self.committed.push(Record::new(id.clone(), fields)),
        }

        Ok(id)
    }

    /// Replace every field of a record, then the matching local row.
    ///
    /// A row missing from the local view is not an error; the next refresh
    /// brings it back in line.
    pub async fn edit(&mut self, id: &RecordId, fields: Fields) -> Result<(), ListingError> {
        self.schema.validate(&fields)?;
        let fields = self.schema.strip_id(fields);

        self.store
            .update(self.schema.collection, id, &fields)
            .await?;
        info!("Updated {}/{}", self.schema.collection, id);

        match self.committed.iter_mut().find(|r| &r.id == id) {
            Some(existing) => existing.fields = fields,
            None => debug!("{} not in current view, left for next refresh", id),
        }

        Ok(())
    }

    /// Delete a record remotely, then drop it from the local rows
    pub async fn remove(&mut self, id: &RecordId) -> Result<(), ListingError> {
        self.store.delete(self.schema.collection, id).await?;
        info!("Deleted {}/{}", self.schema.collection, id);

        self.committed.retain(|r| &r.id != id);
        self.clamp_page();
        Ok(())
    }
}
