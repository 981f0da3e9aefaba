use csv::ReaderBuilder;

use crate::error::LoadError;
use crate::models::{CellValue, RawDataset};

pub fn parse_csv(data: &[u8]) -> Result<RawDataset, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| LoadError::UnreadableFile(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.is_empty() {
        return Err(LoadError::UnreadableFile(
            "No columns to parse from file".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| LoadError::UnreadableFile(e.to_string()))?;
        // Blank lines carry no data
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(CellValue::from_field).collect());
    }

    tracing::debug!("Parsed CSV with {} columns and {} rows", headers.len(), rows.len());
    Ok(RawDataset::new(headers, rows))
}
