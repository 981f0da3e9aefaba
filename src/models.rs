use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// The four columns every upload must carry, in the order they are reported.
pub const REQUIRED_COLUMNS: [&str; 4] = [DATE_COLUMN, PRODUCT_COLUMN, CUSTOMER_COLUMN, SALES_COLUMN];

pub const DATE_COLUMN: &str = "Date";
pub const PRODUCT_COLUMN: &str = "Product";
pub const CUSTOMER_COLUMN: &str = "Customer";
pub const SALES_COLUMN: &str = "Sales";

/// A single cell as read from the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// CSV fields are untyped; an empty field is a missing value.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(field.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) if dt.time() == chrono::NaiveTime::MIN => {
                write!(f, "{}", dt.date())
            }
            CellValue::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

/// Tabular data exactly as the source file declared it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawDataset {
    /// Rows shorter than the header are padded with empty cells, longer rows are cut.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First column carrying exactly this header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// String rendering of the first `n` rows, for the dashboard preview.
    pub fn preview(&self, n: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    pub date: NaiveDate,
    pub product: Option<String>,
    pub customer: Option<String>,
    pub sales: CellValue,
}

/// Rows whose Date column parsed successfully, all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedDataset {
    pub rows: Vec<SalesRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerPurchases {
    pub customer: String,
    pub purchases: usize,
}

pub type DailySalesSeries = Vec<DailySales>;
pub type ProductSalesRanking = Vec<ProductSales>;
pub type CustomerFrequencyTable = Vec<CustomerPurchases>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedViews {
    pub daily_sales: DailySalesSeries,
    pub product_sales: ProductSalesRanking,
    pub top_customers: CustomerFrequencyTable,
}

/// A rendered PNG chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub title: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub sections: Vec<String>,
    pub pages: usize,
}

/// An uploaded file, as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: bytes::Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_are_padded() {
        let ds = RawDataset::new(
            vec!["Date".into(), "Product".into(), "Sales".into()],
            vec![vec![CellValue::Text("2024-01-01".into())]],
        );
        assert_eq!(ds.value(0, "Sales"), Some(&CellValue::Empty));
        assert_eq!(ds.rows()[0].len(), 3);
    }

    #[test]
    fn column_lookup_is_case_sensitive() {
        let ds = RawDataset::new(vec!["date".into(), "Sales".into()], vec![]);
        assert!(!ds.has_column("Date"));
        assert!(ds.has_column("Sales"));
    }

    #[test]
    fn preview_renders_cells_as_strings() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let ds = RawDataset::new(
            vec!["Date".into(), "Sales".into(), "Note".into()],
            vec![
                vec![CellValue::DateTime(midnight), CellValue::Float(12.5), CellValue::Empty],
                vec![CellValue::Text("x".into()), CellValue::Int(3), CellValue::Bool(true)],
            ],
        );
        assert_eq!(
            ds.preview(1),
            vec![vec!["2024-03-01".to_string(), "12.5".to_string(), String::new()]]
        );
        assert_eq!(ds.preview(10).len(), 2);
    }
}
