use crate::record::{FieldValue, Record, RecordSchema};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Download name of the comments export
pub const COMMENTS_EXPORT_FILE: &str = "comments.xlsx";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Export service for turning listing rows into a spreadsheet.
///
/// Stateless: the caller passes the rows it currently shows. A failed export
/// never touches those rows.
pub struct ExportService;

impl ExportService {
    /// File name of the export for `schema`'s collection
    pub fn file_name(schema: &RecordSchema) -> String {
        format!("{}.xlsx", schema.collection)
    }

    /// Serialize `records` to an xlsx buffer.
    ///
    /// One header row with the schema's columns in order, then one row per
    /// record. The identifier column carries the record id, so the file can
    /// be read back by the import pipeline.
    pub fn export_records(
        schema: &RecordSchema,
        records: &[Record],
    ) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(schema.sheet_name)?;

        let header = Format::new().set_bold();
        for (col, spec) in schema.fields.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, spec.name, &header)?;
        }

        for (index, record) in records.iter().enumerate() {
            let row = index as u32 + 1;
            for (col, spec) in schema.fields.iter().enumerate() {
                let col = col as u16;
                if spec.name == schema.id_field {
                    sheet.write_string(row, col, record.id.as_str())?;
                    continue;
                }
                if let Some(value) = record.get(spec.name) {
                    write_value(sheet, row, col, value)?;
                }
            }
        }

        let bytes = workbook.save_to_buffer()?;
        debug!(
            "Exported {} {} records ({} bytes)",
            records.len(),
            schema.collection,
            bytes.len()
        );
        Ok(bytes)
    }

    /// Export `records` into `target_dir`, returning the written path
    pub async fn export_to_dir(
        schema: &RecordSchema,
        records: &[Record],
        target_dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        let bytes = Self::export_records(schema, records)?;
        let path = target_dir.join(Self::file_name(schema));
        tokio::fs::write(&path, &bytes).await?;

        info!("Exported {} records to {}", records.len(), path.display());
        Ok(path)
    }
}

fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &FieldValue,
) -> Result<(), XlsxError> {
    match value {
        FieldValue::Number(n) => sheet.write_number(row, col, *n)?,
        FieldValue::Bool(b) => sheet.write_boolean(row, col, *b)?,
        FieldValue::Text(s) if s.is_empty() => return Ok(()),
        FieldValue::Text(_) | FieldValue::List(_) => sheet.write_string(row, col, value.to_string())?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parse_staged;
    use crate::record::{Fields, RecordId, COMMENT_SCHEMA, TOUR_SCHEMA};

    fn comment(id: &str, name: &str, rating: f64) -> Record {
        let mut fields = Fields::new();
        fields.insert("avatar".into(), FieldValue::text(""));
        fields.insert("name".into(), FieldValue::text(name));
        fields.insert("comment".into(), FieldValue::text("Nice trip"));
        fields.insert("rating".into(), FieldValue::Number(rating));
        Record::new(RecordId::from(id), fields)
    }

    #[test]
    fn test_comments_file_name() {
        assert_eq!(ExportService::file_name(&COMMENT_SCHEMA), COMMENTS_EXPORT_FILE);
    }

    #[test]
    fn test_export_reads_back_as_staged_rows() {
        let records = vec![comment("c1", "Anna", 5.0), comment("c2", "Bob", 3.5)];
        let bytes = ExportService::export_records(&COMMENT_SCHEMA, &records).unwrap();

        let staged = parse_staged(&COMMENT_SCHEMA, &bytes).unwrap();
        assert_eq!(staged.len(), 2);
        for (row, record) in staged.iter().zip(&records) {
            assert_eq!(row.value("key"), Some(&FieldValue::text(record.id.as_str())));
            for field in ["avatar", "name", "comment", "rating"] {
                assert_eq!(row.value(field), record.get(field), "field {}", field);
            }
        }
    }

    #[test]
    fn test_list_fields_survive_export() {
        let mut fields = Fields::new();
        fields.insert("name".into(), FieldValue::text("Ha Long Bay"));
        fields.insert(
            "highlights".into(),
            FieldValue::List(vec!["Kayak".into(), "Caves".into()]),
        );
        let records = vec![Record::new(RecordId::from("t1"), fields)];

        let bytes = ExportService::export_records(&TOUR_SCHEMA, &records).unwrap();
        let staged = parse_staged(&TOUR_SCHEMA, &bytes).unwrap();
        assert_eq!(
            staged[0].value("highlights"),
            Some(&FieldValue::List(vec!["Kayak".into(), "Caves".into()]))
        );
    }

    #[test]
    fn test_empty_listing_exports_header_only() {
        let bytes = ExportService::export_records(&COMMENT_SCHEMA, &[]).unwrap();
        let staged = parse_staged(&COMMENT_SCHEMA, &bytes).unwrap();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn test_export_to_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = ExportService::export_to_dir(&COMMENT_SCHEMA, &[comment("c1", "Anna", 4.0)], dir.path())
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), COMMENTS_EXPORT_FILE);
        assert!(tokio::fs::metadata(&path).await.unwrap().len() > 0);
    }
}
