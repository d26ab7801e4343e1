//! `.xlsx` encoding of the export rows.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, XlsxError};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::constants::FINAL_COLUMNS;
use crate::model::{Cell, JournalRow};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to write workbook: {0}")]
    Write(#[from] XlsxError),
    #[error("failed to read workbook: {0}")]
    Read(String),
    #[error("workbook has no worksheet")]
    NoWorksheet,
    #[error("too many rows for one worksheet: {0}")]
    TooManyRows(usize),
}

/// Header row plus one row per journal. Empty text and missing numbers stay blank.
pub fn encode(rows: &[JournalRow]) -> Result<Vec<u8>, ArtifactError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in (0u16..).zip(FINAL_COLUMNS) {
        sheet.write_string(0, col, name)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let line = u32::try_from(i + 1).map_err(|_| ArtifactError::TooManyRows(rows.len()))?;
        for (col, cell) in (0u16..).zip(row.cells()) {
            match cell {
                Cell::Text(text) if !text.is_empty() => {
                    sheet.write_string(line, col, text)?;
                }
                Cell::Number(Some(value)) => {
                    sheet.write_number(line, col, value)?;
                }
                _ => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Rows of the first worksheet, matched to columns by header name.
///
/// A sheet without a `journal_id` header carries nothing usable and decodes to
/// no rows.
pub fn decode(bytes: &[u8]) -> Result<Vec<JournalRow>, ArtifactError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ArtifactError::Read(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ArtifactError::NoWorksheet)?
        .map_err(|e| ArtifactError::Read(e.to_string()))?;

    let mut lines = range.rows();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let index: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell_text(cell).trim().to_string(), i))
        .collect();
    if !index.contains_key("journal_id") {
        return Ok(Vec::new());
    }

    let rows = lines
        .filter(|line| line.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|line| {
            JournalRow::from_columns(|name| {
                index
                    .get(name)
                    .and_then(|&i| line.get(i))
                    .map(cell_text)
                    .unwrap_or_default()
            })
        })
        .collect();
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Hex SHA-256 of the uploaded bytes, logged with the upload confirmation.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
