use std::io::Cursor;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use crate::error::LoadError;
use crate::models::{CellValue, RawDataset};

/// Reads the first worksheet; its first row is the header.
pub fn parse_xlsx(data: &[u8]) -> Result<RawDataset, LoadError> {
    let start = std::time::Instant::now();
    let cursor = Cursor::new(data);

    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
        .map_err(|e| {
            tracing::error!("Failed to open Excel file: {}", e);
            LoadError::UnreadableFile(format!("Failed to open Excel file: {}", e))
        })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::UnreadableFile("No sheets found in workbook".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::UnreadableFile(format!("Failed to read worksheet {}: {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(idx, cell)| header_name(idx, cell))
            .collect(),
        None => {
            return Err(LoadError::UnreadableFile(
                "No columns to parse from file".to_string(),
            ))
        }
    };

    let body: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(CellValue::is_empty))
        .collect();

    tracing::info!(
        "Read sheet {} ({} columns, {} rows) in {:?}",
        sheet_name,
        headers.len(),
        body.len(),
        start.elapsed()
    );

    Ok(RawDataset::new(headers, body))
}

fn header_name(idx: usize, cell: &Data) -> String {
    match cell {
        Data::Empty => format!("Unnamed: {}", idx),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .parse::<chrono::NaiveDateTime>()
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
