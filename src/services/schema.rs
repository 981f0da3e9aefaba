use crate::error::SchemaError;
use crate::models::{RawDataset, REQUIRED_COLUMNS};

/// Required columns absent from the dataset, in canonical order.
pub fn missing_columns(dataset: &RawDataset) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|col| !dataset.has_column(col))
        .map(|col| col.to_string())
        .collect()
}

pub fn validate(dataset: &RawDataset) -> Result<(), SchemaError> {
    let missing = missing_columns(dataset);
    if missing.is_empty() {
        Ok(())
    } else {
        tracing::warn!("Upload is missing required columns: {:?}", missing);
        Err(SchemaError::MissingColumns(missing))
    }
}
