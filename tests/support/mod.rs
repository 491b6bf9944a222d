#![allow(dead_code)]

pub mod flaky_record_store;
pub mod mock_asset_store;

pub use flaky_record_store::FlakyRecordStore;
pub use mock_asset_store::MockAssetStore;

use tourdesk::record::{FieldValue, Fields};
use tourdesk::validation::UploadFile;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Smallest payload `infer` recognises as PNG
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(len.max(bytes.len()), 0);
    bytes
}

pub fn png_file(name: &str) -> UploadFile {
    UploadFile::new(name, png_bytes(64))
}

/// A complete, valid comment form
pub fn comment_fields(name: &str, rating: f64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("avatar".into(), FieldValue::text(""));
    fields.insert("name".into(), FieldValue::text(name));
    fields.insert("comment".into(), FieldValue::text("Great tour"));
    fields.insert("rating".into(), FieldValue::Number(rating));
    fields
}
