// Spreadsheet -> staged records.
//
// Best-effort by design: a row is never rejected for missing or odd cells.
// Missing columns are default-filled; cells of the wrong type are coerced
// when possible and kept as text otherwise.

use crate::import::types::{ImportError, Slot, StagedRecord};
use crate::record::{FieldKind, FieldValue, RecordSchema};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

/// Data rows of the first sheet, keyed by header name.
///
/// The first row of the used range is the header. Empty cells are left out
/// of a row; rows with no non-empty cell are skipped.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<HashMap<String, Data>>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Spreadsheet(format!("Unreadable workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Spreadsheet("Workbook has no sheets".to_string()))?
        .map_err(|e| ImportError::Spreadsheet(format!("Unreadable sheet: {}", e)))?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for cells in rows {
        let mut row = HashMap::new();
        for (name, cell) in header.iter().zip(cells) {
            if name.is_empty() || is_empty(cell) {
                continue;
            }
            row.entry(name.clone()).or_insert_with(|| cell.clone());
        }
        if !row.is_empty() {
            out.push(row);
        }
    }

    debug!("Read {} data rows ({} columns)", out.len(), header.len());
    Ok(out)
}

/// Parse a spreadsheet into staged records for `schema`.
///
/// Columns outside the schema are ignored.
pub fn parse_staged(
    schema: &RecordSchema,
    bytes: &[u8],
) -> Result<Vec<StagedRecord>, ImportError> {
    let rows = read_rows(bytes)?;

    Ok(rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut staged = StagedRecord::new(index + 1);
            for spec in schema.fields {
                let slot = row
                    .get(spec.name)
                    .and_then(|cell| coerce(spec.kind, cell))
                    .map_or(Slot::Absent, Slot::Value);
                staged.slots.insert(spec.name.to_string(), slot);
            }
            staged.default_fill(schema);
            staged
        })
        .collect())
}

fn is_empty(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => FieldValue::Number(*f).to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => FieldValue::Number(dt.as_f64()).to_string(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Convert a cell to the column's kind. `None` means "treat as missing".
fn coerce(kind: FieldKind, cell: &Data) -> Option<FieldValue> {
    if matches!(cell, Data::Error(_)) || is_empty(cell) {
        return None;
    }

    let value = match (kind, cell) {
        (FieldKind::Number, Data::Float(f)) => FieldValue::Number(*f),
        (FieldKind::Number, Data::Int(i)) => FieldValue::Number(*i as f64),
        (FieldKind::Number, Data::DateTime(dt)) => FieldValue::Number(dt.as_f64()),
        (FieldKind::Number, Data::Bool(b)) => FieldValue::Bool(*b),
        (FieldKind::Number, other) => {
            let text = cell_text(other);
            match text.trim().parse::<f64>() {
                // "NaN" and "inf" parse, but documents only hold finite numbers
                Ok(n) if n.is_finite() => FieldValue::Number(n),
                // Keep what the operator typed rather than dropping it
                _ => FieldValue::Text(text),
            }
        }
        (FieldKind::List, other) => FieldValue::List(
            cell_text(other)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        (FieldKind::Text, other) => FieldValue::Text(cell_text(other)),
    };

    Some(value)
}
