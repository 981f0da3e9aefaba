pub mod aggregator;
pub mod charts;
pub mod dates;
pub mod exporter;
pub mod ingest;
pub mod pipeline;
pub mod schema;

#[cfg(test)]
pub mod test_support;
