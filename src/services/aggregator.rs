use std::collections::{BTreeMap, HashMap};

use crate::error::AggregationError;
use crate::models::{
    CellValue, CustomerFrequencyTable, CustomerPurchases, DailySales, DailySalesSeries,
    DerivedViews, ProductSales, ProductSalesRanking, ValidatedDataset,
};

/// Numeric value of a Sales cell. Empty cells are skipped, like NaN in a column sum.
fn sales_amount(row: usize, cell: &CellValue) -> Result<Option<f64>, AggregationError> {
    let non_numeric = || AggregationError::NonNumericSales {
        row,
        value: cell.to_string(),
    };

    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Int(i) => Ok(Some(*i as f64)),
        CellValue::Float(f) => Ok(Some(*f)),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(non_numeric()),
            }
        }
        CellValue::Bool(_) | CellValue::DateTime(_) => Err(non_numeric()),
    }
}

/// Groups by key in first-seen order, then sorts descending; `sort_by` is stable.
struct Tally<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V: Copy + std::ops::AddAssign + PartialOrd> Tally<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn add(&mut self, key: &str, amount: V) {
        match self.index.get(key) {
            Some(&idx) => self.entries[idx].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), amount));
            }
        }
    }

    fn into_descending(self) -> Vec<(String, V)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
        });
        entries
    }
}

fn checked_total(key: impl ToString, total: f64) -> Result<f64, AggregationError> {
    if total.is_finite() {
        Ok(total)
    } else {
        Err(AggregationError::NonFiniteTotal { key: key.to_string() })
    }
}

fn daily_sales(
    amounts: &[(usize, Option<f64>)],
    dataset: &ValidatedDataset,
) -> Result<DailySalesSeries, AggregationError> {
    let mut by_date = BTreeMap::new();
    for &(idx, amount) in amounts {
        *by_date.entry(dataset.rows[idx].date).or_insert(0.0) += amount.unwrap_or(0.0);
    }
    by_date
        .into_iter()
        .map(|(date, sales)| Ok(DailySales { date, sales: checked_total(date, sales)? }))
        .collect()
}

fn product_sales(
    amounts: &[(usize, Option<f64>)],
    dataset: &ValidatedDataset,
) -> Result<ProductSalesRanking, AggregationError> {
    let mut tally = Tally::<f64>::new();
    for &(idx, amount) in amounts {
        if let Some(product) = &dataset.rows[idx].product {
            tally.add(product, amount.unwrap_or(0.0));
        }
    }
    for (product, total) in &tally.entries {
        checked_total(product, *total)?;
    }
    Ok(tally
        .into_descending()
        .into_iter()
        .map(|(product, sales)| ProductSales { product, sales })
        .collect())
}

fn customer_frequency(dataset: &ValidatedDataset, top_n: usize) -> CustomerFrequencyTable {
    let mut tally = Tally::<usize>::new();
    for row in &dataset.rows {
        if let Some(customer) = &row.customer {
            tally.add(customer, 1);
        }
    }
    tally
        .into_descending()
        .into_iter()
        .take(top_n)
        .map(|(customer, purchases)| CustomerPurchases { customer, purchases })
        .collect()
}

/// Computes the three derived views. Any non-numeric Sales value fails the
/// whole aggregation before a single view is produced.
pub fn aggregate(dataset: &ValidatedDataset, top_customers: usize) -> Result<DerivedViews, AggregationError> {
    let amounts = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| sales_amount(idx + 1, &row.sales).map(|amount| (idx, amount)))
        .collect::<Result<Vec<_>, _>>()?;

    let views = DerivedViews {
        daily_sales: daily_sales(&amounts, dataset)?,
        product_sales: product_sales(&amounts, dataset)?,
        top_customers: customer_frequency(dataset, top_customers),
    };

    tracing::info!(
        "Aggregated {} rows into {} days, {} products, {} customers",
        dataset.rows.len(),
        views.daily_sales.len(),
        views.product_sales.len(),
        views.top_customers.len()
    );

    Ok(views)
}
