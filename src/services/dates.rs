use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::error::DateError;
use crate::models::{
    CellValue, RawDataset, SalesRow, ValidatedDataset, CUSTOMER_COLUMN, DATE_COLUMN,
    PRODUCT_COLUMN, SALES_COLUMN,
};

// Month-first before day-first; two-digit years before four so "01/02/24" is 2024.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%y",
    "%m-%d-%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const MIN_YEAR: i32 = 1000;

/// Parses free-form date text. Any time-of-day component is dropped.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // %Y accepts one to four digits, so "1/5/24" would otherwise read as year 1
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .find(|d| d.year() >= MIN_YEAR)
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
                .find(|d| d.year() >= MIN_YEAR)
        })
}

pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date_str(s),
        _ => None,
    }
}

fn key_of(cell: Option<&CellValue>) -> Option<String> {
    match cell {
        None | Some(CellValue::Empty) => None,
        Some(other) => Some(other.to_string()),
    }
}

/// Reparses the Date column of every row; a single bad value rejects the dataset.
///
/// Expects a dataset that already passed schema validation.
pub fn normalize_dates(dataset: RawDataset) -> Result<ValidatedDataset, DateError> {
    let date_idx = dataset.column_index(DATE_COLUMN);
    let product_idx = dataset.column_index(PRODUCT_COLUMN);
    let customer_idx = dataset.column_index(CUSTOMER_COLUMN);
    let sales_idx = dataset.column_index(SALES_COLUMN);

    let mut rows = Vec::with_capacity(dataset.row_count());
    for (i, row) in dataset.rows().iter().enumerate() {
        let cell = date_idx.and_then(|idx| row.get(idx)).unwrap_or(&CellValue::Empty);
        let date = parse_date(cell).ok_or_else(|| {
            tracing::warn!("Unparseable date {:?} in row {}", cell, i + 1);
            DateError::UnparseableDate {
                row: i + 1,
                value: cell.to_string(),
            }
        })?;

        rows.push(SalesRow {
            date,
            product: key_of(product_idx.and_then(|idx| row.get(idx))),
            customer: key_of(customer_idx.and_then(|idx| row.get(idx))),
            sales: sales_idx
                .and_then(|idx| row.get(idx))
                .cloned()
                .unwrap_or(CellValue::Empty),
        });
    }

    tracing::debug!("Normalized {} dates", rows.len());
    Ok(ValidatedDataset { rows })
}
